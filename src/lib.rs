//! # media-dl
//!
//! Backend library for media download services built on an external yt-dlp
//! compatible worker.
//!
//! ## Design Philosophy
//!
//! media-dl is designed to be:
//! - **Library-first** - The HTTP API is thin glue over [`MediaDownloader`]
//! - **Streaming** - Progress reaches the client as soon as the worker prints it
//! - **Predictable** - Every request ends with exactly one terminal event
//!
//! A download runs the worker once. If the worker asks for a signed-in session and
//! a cookie file is available, it runs once more with the cookie file attached.
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, DownloadRequest, MediaDownloader, MediaFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default()).await?;
//!
//!     // The URL must already be validated (see `api::validate_request`)
//!     let request = DownloadRequest::new("https://youtu.be/abc", MediaFormat::Audio);
//!     let mut events = downloader.start_download(request);
//!
//!     while let Some(event) = events.recv().await {
//!         println!("Event: {}", serde_json::to_string(&event)?);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP API module
pub mod api;
/// Configuration types
pub mod config;
/// Session cookie lookup
pub mod credentials;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Progress line parsing
pub mod progress;
/// Per-job event sink
pub mod publisher;
/// Single credential retry state machine
pub mod retry;
/// Core types and events
pub mod types;
/// External worker process
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use downloader::MediaDownloader;
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus, WorkerError};
pub use types::{DownloadRequest, JobEvent, JobResult, MediaFormat, ProgressEvent, SizeEstimate};
pub use worker::{CliWorker, WorkerLauncher};

/// Helper function to serve the API with graceful signal handling.
///
/// Serves on the downloader's configured bind address until a termination signal
/// arrives, then lets open event streams finish and returns.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use media_dl::{MediaDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let downloader = MediaDownloader::new(config).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    let config = downloader.config().clone();
    api::start_api_server_with_shutdown(std::sync::Arc::new(downloader), config, wait_for_signal())
        .await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
