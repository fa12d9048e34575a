//! Argument set for one worker execution

use crate::credentials::Credentials;
use std::path::PathBuf;

/// What the worker is asked to do
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorkerMode {
    /// Download the media, streaming progress text to stdout
    #[default]
    Download,
    /// Print structured JSON metadata to stdout and exit without downloading
    Metadata,
}

/// One execution of the worker with a fixed argument set
///
/// Created once per attempt and never mutated; the credentialed retry is a new value
/// produced by [`with_credentials`](Self::with_credentials).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerInvocation {
    url: String,
    format_selector: String,
    output_path: Option<PathBuf>,
    user_agent: Option<String>,
    cookie_file: Option<PathBuf>,
    mode: WorkerMode,
    extra_args: Vec<String>,
}

impl WorkerInvocation {
    /// Start building an invocation for `url` with the given format selector
    pub fn builder(
        url: impl Into<String>,
        format_selector: impl Into<String>,
    ) -> WorkerInvocationBuilder {
        WorkerInvocationBuilder {
            invocation: WorkerInvocation {
                url: url.into(),
                format_selector: format_selector.into(),
                output_path: None,
                user_agent: None,
                cookie_file: None,
                mode: WorkerMode::Download,
                extra_args: Vec::new(),
            },
        }
    }

    /// Copy of this invocation with the cookie file attached
    pub fn with_credentials(&self, credentials: &Credentials) -> Self {
        Self {
            cookie_file: Some(credentials.cookie_file().to_path_buf()),
            ..self.clone()
        }
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Format selector string
    pub fn format_selector(&self) -> &str {
        &self.format_selector
    }

    /// Output file path, if any
    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    /// Cookie file attached to this attempt
    pub fn cookie_file(&self) -> Option<&PathBuf> {
        self.cookie_file.as_ref()
    }

    /// Whether this attempt carries credentials
    pub fn has_credentials(&self) -> bool {
        self.cookie_file.is_some()
    }

    /// Requested mode
    pub fn mode(&self) -> WorkerMode {
        self.mode
    }

    /// Command-line arguments for a yt-dlp compatible executable
    ///
    /// The URL always comes last, after `--`, so it can never be read as an option.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--format".to_string(), self.format_selector.clone()];

        match self.mode {
            WorkerMode::Download => {
                if let Some(output) = &self.output_path {
                    args.push("--output".into());
                    args.push(output.to_string_lossy().into_owned());
                }
                args.push("--newline".into());
            }
            WorkerMode::Metadata => {
                args.push("--dump-single-json".into());
                args.push("--skip-download".into());
                args.push("--no-warnings".into());
            }
        }

        args.push("--no-playlist".into());

        if let Some(user_agent) = &self.user_agent {
            args.push("--user-agent".into());
            args.push(user_agent.clone());
        }

        if let Some(cookie_file) = &self.cookie_file {
            args.push("--cookies".into());
            args.push(cookie_file.to_string_lossy().into_owned());
        }

        if self.mode == WorkerMode::Download {
            args.extend(self.extra_args.iter().cloned());
        }

        args.push("--".into());
        args.push(self.url.clone());
        args
    }
}

/// Builder for [`WorkerInvocation`]
#[derive(Debug)]
pub struct WorkerInvocationBuilder {
    invocation: WorkerInvocation,
}

impl WorkerInvocationBuilder {
    /// Where the downloaded file is written
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.invocation.output_path = Some(path.into());
        self
    }

    /// User-agent override
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.invocation.user_agent = Some(user_agent.into());
        self
    }

    /// Cookie file
    pub fn cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.invocation.cookie_file = Some(path.into());
        self
    }

    /// Download or metadata mode
    pub fn mode(mut self, mode: WorkerMode) -> Self {
        self.invocation.mode = mode;
        self
    }

    /// Pass-through flags appended in download mode
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.invocation.extra_args = args;
        self
    }

    /// Finish building
    pub fn build(self) -> WorkerInvocation {
        self.invocation
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn download_invocation() -> WorkerInvocation {
        WorkerInvocation::builder("https://youtu.be/abc", "bestaudio/best")
            .output_path("/srv/downloads/1700000000000.mp3")
            .user_agent("test-agent")
            .extra_args(vec!["--extract-audio".into()])
            .build()
    }

    #[test]
    fn test_download_args() {
        let args = download_invocation().to_args();

        assert_eq!(&args[..2], &["--format", "bestaudio/best"]);
        assert!(args.windows(2).any(|w| w == ["--output", "/srv/downloads/1700000000000.mp3"]));
        assert!(args.windows(2).any(|w| w == ["--user-agent", "test-agent"]));
        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"--extract-audio".to_string()));
        assert!(!args.contains(&"--cookies".to_string()));
        assert_eq!(&args[args.len() - 2..], &["--", "https://youtu.be/abc"]);
    }

    #[test]
    fn test_metadata_args_skip_download_flags() {
        let invocation = WorkerInvocation::builder("https://youtu.be/abc", "best")
            .output_path("/tmp/ignored.mp4")
            .extra_args(vec!["--merge-output-format".into(), "mp4".into()])
            .mode(WorkerMode::Metadata)
            .build();
        let args = invocation.to_args();

        assert!(args.contains(&"--dump-single-json".to_string()));
        assert!(args.contains(&"--skip-download".to_string()));
        assert!(!args.contains(&"--output".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
    }

    #[test]
    fn test_with_credentials_only_adds_cookie_file() {
        let first = download_invocation();
        let retry = first.with_credentials(&Credentials::new("/etc/cookies.txt"));

        assert!(!first.has_credentials());
        assert!(retry.has_credentials());
        assert_eq!(retry.url(), first.url());
        assert_eq!(retry.format_selector(), first.format_selector());
        assert_eq!(retry.output_path(), first.output_path());
        assert!(
            retry
                .to_args()
                .windows(2)
                .any(|w| w == ["--cookies", "/etc/cookies.txt"])
        );
    }
}
