//! External extraction worker
//!
//! The worker is a black-box subprocess (yt-dlp or a compatible tool). This module
//! describes one execution of it and launches it asynchronously.
//!
//! ## Architecture
//!
//! - [`WorkerInvocation`]: immutable argument set for one attempt
//! - [`WorkerLauncher`]: trait that starts an invocation and returns a [`WorkerHandle`]
//! - [`CliWorker`]: launcher that spawns the real executable
//! - [`WorkerOutcome`]: how the process ended, produced once at exit
//!
//! A [`WorkerHandle`] exposes three independent channels: raw stdout chunks, raw
//! stderr chunks, and the single-resolution outcome. Callers must drain stdout before
//! awaiting the outcome so every progress line is observed first.
//!
//! ## Usage
//!
//! ```no_run
//! use futures::StreamExt;
//! use media_dl::worker::{CliWorker, WorkerInvocation, WorkerLauncher, WorkerMode};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let worker = CliWorker::from_path().expect("yt-dlp not found");
//! let invocation = WorkerInvocation::builder("https://youtu.be/dQw4w9WgXcQ", "bestaudio/best")
//!     .output_path("downloads/1.mp3")
//!     .mode(WorkerMode::Download)
//!     .build();
//!
//! let mut handle = worker.launch(&invocation).await;
//! while let Some(chunk) = handle.stdout.next().await {
//!     print!("{}", String::from_utf8_lossy(&chunk));
//! }
//! println!("{:?}", handle.outcome.await);
//! # }
//! ```

mod cli;
mod invocation;
mod outcome;
mod traits;

pub use cli::CliWorker;
pub use invocation::{WorkerInvocation, WorkerInvocationBuilder, WorkerMode};
pub use outcome::{AUTH_FAILURE_MARKER, WorkerOutcome, failure_message};
pub use traits::{ChunkStream, OutcomeFuture, WorkerHandle, WorkerLauncher};
