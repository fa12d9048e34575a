//! Launcher trait and handle types

use super::invocation::WorkerInvocation;
use super::outcome::WorkerOutcome;
use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};

/// Raw output chunks, in the order the worker wrote them
pub type ChunkStream = BoxStream<'static, Vec<u8>>;

/// Resolves once, when the worker exits or fails to start
pub type OutcomeFuture = BoxFuture<'static, WorkerOutcome>;

/// A started worker
///
/// The stdout and stderr streams end when the worker closes the corresponding pipe.
/// The handle exclusively owns the process' pipes; nothing else reads them.
pub struct WorkerHandle {
    /// Raw standard output
    pub stdout: ChunkStream,
    /// Raw standard error; diagnostic only
    pub stderr: ChunkStream,
    /// Exit outcome
    pub outcome: OutcomeFuture,
}

impl WorkerHandle {
    /// Assemble a handle from its three channels
    pub fn new(stdout: ChunkStream, stderr: ChunkStream, outcome: OutcomeFuture) -> Self {
        Self {
            stdout,
            stderr,
            outcome,
        }
    }

    /// Handle for a worker that never started
    ///
    /// Both streams are empty and the outcome is an immediate non-auth failure.
    pub fn failed_to_start(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            stdout: stream::empty().boxed(),
            stderr: stream::empty().boxed(),
            outcome: futures::future::ready(WorkerOutcome::Failure {
                message,
                is_auth_error: false,
            })
            .boxed(),
        }
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle").finish_non_exhaustive()
    }
}

/// Starts worker executions
///
/// Implementations must not block the caller while the process runs: `launch`
/// returns as soon as the process is started (or has failed to start), and all
/// further progress is observed through the returned [`WorkerHandle`].
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    /// Name of the launcher (for logging)
    fn name(&self) -> &'static str;

    /// Start one execution
    ///
    /// A start failure is reported through the handle's outcome, never as an error.
    async fn launch(&self, invocation: &WorkerInvocation) -> WorkerHandle;
}
