//! Worker launcher that spawns an external yt-dlp compatible binary

use super::invocation::WorkerInvocation;
use super::outcome::{WorkerOutcome, failure_message};
use super::traits::{WorkerHandle, WorkerLauncher};
use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Executable names searched for in PATH, in order
const WORKER_BINARIES: [&str; 2] = ["yt-dlp", "youtube-dl"];

/// Chunks buffered per pipe before the reader waits for the consumer
const CHUNK_BUFFER: usize = 32;

const READ_SIZE: usize = 8 * 1024;

/// Launches the worker as a child process
///
/// # Examples
///
/// ```no_run
/// use media_dl::worker::CliWorker;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let worker = CliWorker::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let worker = CliWorker::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Clone, Debug)]
pub struct CliWorker {
    binary_path: PathBuf,
    base_args: Vec<String>,
}

impl CliWorker {
    /// Create a launcher for an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            base_args: Vec::new(),
        }
    }

    /// Arguments placed before the invocation's own, e.g. `["-m", "yt_dlp"]` for a
    /// Python interpreter
    pub fn with_base_args(mut self, base_args: Vec<String>) -> Self {
        self.base_args = base_args;
        self
    }

    /// Attempt to find `yt-dlp` (or `youtube-dl`) in PATH
    pub fn from_path() -> Option<Self> {
        WORKER_BINARIES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
    }

    /// Path of the executable this launcher runs
    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }
}

#[async_trait]
impl WorkerLauncher for CliWorker {
    fn name(&self) -> &'static str {
        "cli-worker"
    }

    async fn launch(&self, invocation: &WorkerInvocation) -> WorkerHandle {
        let mut child = match Command::new(&self.binary_path)
            .args(&self.base_args)
            .args(invocation.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(
                    binary = %self.binary_path.display(),
                    error = %e,
                    "Failed to start worker"
                );
                return WorkerHandle::failed_to_start(format!(
                    "failed to start {}: {}",
                    self.binary_path.display(),
                    e
                ));
            }
        };

        tracing::debug!(
            binary = %self.binary_path.display(),
            pid = ?child.id(),
            url = invocation.url(),
            credentials = invocation.has_credentials(),
            "Worker started"
        );

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            // Both pipes were requested above, so this only happens if the OS refused them
            let _ = child.start_kill();
            return WorkerHandle::failed_to_start("worker pipes were not captured");
        };

        let (stdout_tx, stdout_rx) = mpsc::channel(CHUNK_BUFFER);
        let (stderr_tx, stderr_rx) = mpsc::channel(CHUNK_BUFFER);

        let stdout_task = tokio::spawn(pump(stdout, stdout_tx, false));
        let stderr_task = tokio::spawn(pump(stderr, stderr_tx, true));

        let outcome = async move {
            let status = child.wait().await;
            // stdout EOF is awaited so the outcome never overtakes buffered output
            let _ = stdout_task.await;
            let captured = stderr_task.await.unwrap_or_default();

            match status {
                Ok(status) if status.success() => WorkerOutcome::Success,
                Ok(status) => {
                    WorkerOutcome::failure(failure_message(&captured, &status.to_string()))
                }
                Err(e) => WorkerOutcome::failure(format!("failed to wait for worker: {}", e)),
            }
        }
        .boxed();

        WorkerHandle::new(
            ReceiverStream::new(stdout_rx).boxed(),
            ReceiverStream::new(stderr_rx).boxed(),
            outcome,
        )
    }
}

/// Copy a pipe into a channel until EOF, optionally keeping a copy of everything read
///
/// Keeps reading after the receiver is gone so the worker never blocks on a full pipe.
async fn pump<R>(mut reader: R, tx: mpsc::Sender<Vec<u8>>, capture: bool) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let mut buf = vec![0u8; READ_SIZE];
    let mut forwarding = true;

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "Worker pipe read failed");
                break;
            }
        };

        if capture {
            captured.extend_from_slice(&buf[..n]);
        }
        if forwarding && tx.send(buf[..n].to_vec()).await.is_err() {
            forwarding = false;
        }
    }

    captured
}
