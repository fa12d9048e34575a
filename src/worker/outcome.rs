//! Worker exit classification

/// Substring of a worker failure message that marks an authentication requirement
///
/// This is a plain text match against the worker's free-form error output and will
/// stop matching if the worker rewords its message.
pub const AUTH_FAILURE_MARKER: &str = "Sign in";

/// How one worker execution ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Exit code 0
    Success,
    /// Non-zero exit, or the process could not be started
    Failure {
        /// The worker's failure message
        message: String,
        /// Whether the message asks for a signed-in session
        is_auth_error: bool,
    },
}

impl WorkerOutcome {
    /// Build a failure, classifying it from its message alone
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let is_auth_error = message.contains(AUTH_FAILURE_MARKER);
        Self::Failure {
            message,
            is_auth_error,
        }
    }

    /// Whether the worker succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether this is a failure asking for authentication
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Failure {
                is_auth_error: true,
                ..
            }
        )
    }
}

/// Derive a failure message from captured stderr
///
/// Prefers the worker's `ERROR:` lines, then its last non-empty line, then a
/// generic description of the exit status.
pub fn failure_message(stderr: &[u8], exit_description: &str) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let errors: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        return errors.join("\n");
    }

    match lines.last() {
        Some(line) => (*line).to_string(),
        None => format!("worker exited with {}", exit_description),
    }
}
