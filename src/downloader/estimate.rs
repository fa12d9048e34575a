//! Size estimation through the worker's metadata mode
//!
//! The worker is asked for its JSON description of the media instead of the media
//! itself. The same credential retry as for downloads applies.

use super::MediaDownloader;
use crate::error::{Error, Result, WorkerError};
use crate::retry::{Resolution, RetryCoordinator};
use crate::types::{DownloadRequest, SizeEstimate};
use crate::worker::{WorkerHandle, WorkerInvocation, WorkerLauncher, WorkerMode, WorkerOutcome};
use futures::StreamExt;
use serde::Deserialize;

/// Size fields of one format entry in the worker's metadata
#[derive(Debug, Default, Deserialize)]
struct FormatSize {
    #[serde(default)]
    filesize: Option<f64>,
    #[serde(default)]
    filesize_approx: Option<f64>,
}

impl FormatSize {
    /// Exact size if known, otherwise the approximate one
    fn bytes(&self) -> Option<(u64, bool)> {
        let valid = |value: f64| value.is_finite() && value >= 0.0;
        match (self.filesize, self.filesize_approx) {
            (Some(exact), _) if valid(exact) => Some((exact.round() as u64, false)),
            (_, Some(approx)) if valid(approx) => Some((approx.round() as u64, true)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaMetadata {
    #[serde(flatten)]
    size: FormatSize,
    /// Present when the selector merges several formats (e.g. video + audio)
    #[serde(default)]
    requested_formats: Option<Vec<FormatSize>>,
}

/// Compute a size estimate from the worker's `--dump-single-json` output
///
/// With `requested_formats`, the parts are summed; otherwise the top-level size is
/// used. A part without any size makes the estimate approximate. `bytes` is `None`
/// only when no part reported a size.
pub fn parse_size_estimate(metadata: &[u8]) -> Result<SizeEstimate> {
    let metadata: MediaMetadata = serde_json::from_slice(metadata)
        .map_err(|e| Error::Worker(WorkerError::Metadata(e.to_string())))?;

    let parts: Vec<Option<(u64, bool)>> = match &metadata.requested_formats {
        Some(formats) if !formats.is_empty() => formats.iter().map(FormatSize::bytes).collect(),
        _ => vec![metadata.size.bytes()],
    };

    let known: Vec<(u64, bool)> = parts.iter().flatten().copied().collect();
    if known.is_empty() {
        return Ok(SizeEstimate {
            bytes: None,
            approximate: false,
        });
    }

    Ok(SizeEstimate {
        bytes: Some(known.iter().map(|(bytes, _)| *bytes).sum()),
        approximate: known.len() < parts.len() || known.iter().any(|(_, approx)| *approx),
    })
}

impl MediaDownloader {
    /// Estimate how large the download for `request` would be
    ///
    /// Same precondition as [`start_download`](Self::start_download): the request
    /// is already validated. Worker failures are returned as [`Error::Worker`].
    pub async fn estimate_size(&self, request: &DownloadRequest) -> Result<SizeEstimate> {
        let mut coordinator = RetryCoordinator::new(self.credentials.resolve());
        let base = WorkerInvocation::builder(&request.url, request.format.selector())
            .user_agent(&self.config.tools.user_agent)
            .mode(WorkerMode::Metadata)
            .build();

        loop {
            let Some(invocation) = coordinator.next_attempt().map(|plan| plan.apply(&base)) else {
                return Err(Error::Other("no worker attempt was made".to_string()));
            };

            let (stdout, outcome) = collect_output(self.launcher.as_ref(), &invocation).await;

            match coordinator.observe(outcome) {
                None => continue,
                Some(Resolution::Succeeded { .. }) => {
                    let estimate = parse_size_estimate(&stdout)?;
                    tracing::debug!(
                        url = %request.url,
                        bytes = ?estimate.bytes,
                        approximate = estimate.approximate,
                        "Size estimated"
                    );
                    return Ok(estimate);
                }
                Some(Resolution::Failed { error, attempts }) => {
                    tracing::warn!(url = %request.url, attempts, error = %error, "Size estimation failed");
                    return Err(error.into());
                }
            }
        }
    }
}

/// Run one metadata invocation to completion, keeping its whole stdout
async fn collect_output(
    launcher: &dyn WorkerLauncher,
    invocation: &WorkerInvocation,
) -> (Vec<u8>, WorkerOutcome) {
    let WorkerHandle {
        mut stdout,
        stderr,
        outcome,
    } = launcher.launch(invocation).await;

    let stderr_drain = tokio::spawn(stderr.count());

    let mut collected = Vec::new();
    while let Some(chunk) = stdout.next().await {
        collected.extend_from_slice(&chunk);
    }

    let outcome = outcome.await;
    let _ = stderr_drain.await;
    (collected, outcome)
}
