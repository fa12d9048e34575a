//! Download job driver
//!
//! A job runs the worker once, or twice when the coordinator asks for the
//! credentialed retry. Each attempt goes through the same [`run_attempt`]: launch,
//! stream progress to the publisher as lines complete, then wait for the exit
//! outcome. The terminal event is published only after the attempt's stdout is
//! fully drained, so it always comes last.

use crate::error::WorkerError;
use crate::progress::extract_progress;
use crate::publisher::ProgressPublisher;
use crate::retry::{Resolution, RetryCoordinator};
use crate::types::JobResult;
use crate::worker::{ChunkStream, WorkerHandle, WorkerInvocation, WorkerLauncher, WorkerOutcome};
use futures::StreamExt;
use std::sync::Arc;

/// Everything one download job needs, moved onto the job's task
pub(crate) struct DownloadJob {
    /// Output file stamp, doubles as the job id in logs
    pub(crate) id: i64,
    pub(crate) launcher: Arc<dyn WorkerLauncher>,
    /// First-attempt invocation; the retry derives from it
    pub(crate) invocation: WorkerInvocation,
    /// Path reported in the `completed` event
    pub(crate) public_file: String,
    pub(crate) coordinator: RetryCoordinator,
    pub(crate) publisher: ProgressPublisher,
}

impl DownloadJob {
    /// Drive the job to its terminal event
    ///
    /// Never fails: every failure becomes [`JobResult::Failed`].
    pub(crate) async fn run(mut self) -> JobResult {
        let resolution = loop {
            let Some((attempt, invocation)) = self
                .coordinator
                .next_attempt()
                .map(|plan| (plan.number(), plan.apply(&self.invocation)))
            else {
                // The coordinator always resolves before it stops planning attempts
                break Resolution::Failed {
                    error: WorkerError::Failed {
                        message: "no worker attempt was made".to_string(),
                    },
                    attempts: self.coordinator.attempts(),
                };
            };

            let outcome = run_attempt(
                self.id,
                attempt,
                self.launcher.as_ref(),
                &invocation,
                &mut self.publisher,
            )
            .await;

            if let Some(resolution) = self.coordinator.observe(outcome) {
                break resolution;
            }
        };

        let result = match resolution {
            Resolution::Succeeded { attempts } => {
                tracing::info!(
                    job = self.id,
                    attempts,
                    file = %self.public_file,
                    "Download completed"
                );
                JobResult::Completed {
                    file: self.public_file,
                }
            }
            Resolution::Failed { error, attempts } => {
                tracing::warn!(job = self.id, attempts, error = %error, "Download failed");
                JobResult::Failed {
                    message: error.to_string(),
                }
            }
        };

        if self.publisher.is_closed() {
            tracing::debug!(job = self.id, "Client gone before the terminal event");
        }
        self.publisher.finish(result.clone()).await;
        result
    }
}

/// Run one invocation and forward its progress
///
/// Returns once the worker has exited and its stdout is drained.
async fn run_attempt(
    job: i64,
    attempt: u32,
    launcher: &dyn WorkerLauncher,
    invocation: &WorkerInvocation,
    publisher: &mut ProgressPublisher,
) -> WorkerOutcome {
    tracing::info!(
        job,
        attempt,
        worker = launcher.name(),
        credentials = invocation.has_credentials(),
        "Starting worker"
    );

    let WorkerHandle {
        stdout,
        stderr,
        outcome,
    } = launcher.launch(invocation).await;

    let stderr_log = tokio::spawn(log_stderr(job, attempt, stderr));

    let progress = extract_progress(stdout);
    tokio::pin!(progress);
    while let Some(event) = progress.next().await {
        publisher.publish(event).await;
    }

    let outcome = outcome.await;
    let _ = stderr_log.await;

    if let WorkerOutcome::Failure {
        message,
        is_auth_error,
    } = &outcome
    {
        tracing::warn!(
            job,
            attempt,
            auth = *is_auth_error,
            error = %message,
            "Worker attempt failed"
        );
    }

    outcome
}

/// Stderr is diagnostic only: log it and never inspect it
async fn log_stderr(job: i64, attempt: u32, mut stderr: ChunkStream) {
    while let Some(chunk) = stderr.next().await {
        for line in String::from_utf8_lossy(&chunk)
            .lines()
            .filter(|line| !line.trim().is_empty())
        {
            tracing::debug!(job, attempt, line, "Worker stderr");
        }
    }
}
