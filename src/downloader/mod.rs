//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by concern:
//! - [`job`] - One download job: worker attempts, progress forwarding, terminal event
//! - [`estimate`] - Size estimation through the worker's metadata mode

mod estimate;
mod job;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use estimate::parse_size_estimate;

use crate::config::Config;
use crate::credentials::CredentialResolver;
use crate::error::{Error, Result};
use crate::publisher::ProgressPublisher;
use crate::retry::RetryCoordinator;
use crate::types::{DownloadRequest, JobEvent};
use crate::worker::{CliWorker, WorkerInvocation, WorkerLauncher};
use job::DownloadJob;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::mpsc;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// Jobs share nothing but the output directory; each one gets its own file name,
/// credential lookup, coordinator and event channel.
#[derive(Clone)]
pub struct MediaDownloader {
    /// Configuration (wrapped in Arc for sharing across jobs)
    pub(crate) config: Arc<Config>,
    /// Starts worker executions
    pub(crate) launcher: Arc<dyn WorkerLauncher>,
    /// Cookie file lookup, run once per request
    pub(crate) credentials: CredentialResolver,
    /// Last output file stamp handed out
    last_stamp: Arc<AtomicI64>,
}

impl MediaDownloader {
    /// Create a new MediaDownloader instance
    ///
    /// Creates the download directory and picks the worker binary: the configured
    /// `worker_path` if set, otherwise `yt-dlp` or `youtube-dl` from PATH. If neither
    /// is found, jobs still run and fail with the worker's start error.
    pub async fn new(config: Config) -> Result<Self> {
        let binary = if let Some(ref worker_path) = config.tools.worker_path {
            // Use explicitly configured binary path
            Some(CliWorker::new(worker_path.clone()))
        } else if config.tools.search_path {
            // Search PATH for the worker binary
            CliWorker::from_path()
        } else {
            None
        };

        let worker = binary
            .unwrap_or_else(|| {
                tracing::warn!("No worker binary found, downloads will fail until one is installed");
                CliWorker::new(PathBuf::from("yt-dlp"))
            })
            .with_base_args(config.tools.worker_args.clone());

        tracing::info!(
            worker = %worker.binary_path().display(),
            "Worker launcher initialized"
        );

        Self::with_launcher(config, Arc::new(worker)).await
    }

    /// Create a MediaDownloader with a custom worker launcher
    pub async fn with_launcher(config: Config, launcher: Arc<dyn WorkerLauncher>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let credentials = CredentialResolver::new(config.tools.cookies_file.clone());

        Ok(Self {
            config: Arc::new(config),
            launcher,
            credentials,
            last_stamp: Arc::new(AtomicI64::new(0)),
        })
    }

    /// Configuration this downloader runs with
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Start a download job and return its event stream
    ///
    /// The request must already be validated: its URL restricted to the allowed
    /// hosts and free of markup. No further checks happen here.
    ///
    /// The job runs on its own task. The receiver yields zero or more progress
    /// events followed by exactly one terminal event, then ends. Dropping the
    /// receiver does not stop the worker; the file is still written.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_download(&self, request: DownloadRequest) -> mpsc::Receiver<JobEvent> {
        let (job, events) = self.prepare_job(request);
        tokio::spawn(job.run());
        events
    }

    pub(crate) fn prepare_job(&self, request: DownloadRequest) -> (DownloadJob, mpsc::Receiver<JobEvent>) {
        let credentials = self.credentials.resolve();
        let stamp = self.next_stamp();

        let file_name = format!("{}.{}", stamp, request.format.extension());
        let output_path = self.config.download_dir().join(&file_name);
        let public_file = format!(
            "{}/{}",
            self.config.download.public_path.trim_matches('/'),
            file_name
        );

        let invocation = WorkerInvocation::builder(&request.url, request.format.selector())
            .output_path(output_path)
            .user_agent(&self.config.tools.user_agent)
            .extra_args(request.format.post_process_args())
            .build();

        tracing::info!(
            job = stamp,
            url = %request.url,
            format = %request.format,
            credentials = credentials.is_some(),
            "Download requested"
        );

        let (publisher, events) = ProgressPublisher::channel(self.config.download.event_buffer);
        let job = DownloadJob {
            id: stamp,
            launcher: self.launcher.clone(),
            invocation,
            public_file,
            coordinator: RetryCoordinator::new(credentials),
            publisher,
        };

        (job, events)
    }

    /// Arrival time in Unix milliseconds, bumped so no two requests share a stamp
    fn next_stamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

impl std::fmt::Debug for MediaDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaDownloader")
            .field("launcher", &self.launcher.name())
            .field("download_dir", self.config.download_dir())
            .field("cookies_file", &self.credentials.path())
            .finish_non_exhaustive()
    }
}
