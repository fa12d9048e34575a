//! Core types for media-dl

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Requested media kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Audio only, extracted to mp3
    #[serde(alias = "mp3")]
    Audio,
    /// Video with audio, merged into mp4
    #[serde(alias = "mp4")]
    Video,
}

impl MediaFormat {
    /// File extension of the produced file
    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Audio => "mp3",
            MediaFormat::Video => "mp4",
        }
    }

    /// Worker format selector for this media kind
    pub fn selector(&self) -> &'static str {
        match self {
            MediaFormat::Audio => "bestaudio/best",
            MediaFormat::Video => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
        }
    }

    /// Pass-through post-processing flags handed to the worker in download mode
    pub fn post_process_args(&self) -> Vec<String> {
        match self {
            MediaFormat::Audio => vec![
                "--extract-audio".into(),
                "--audio-format".into(),
                "mp3".into(),
            ],
            MediaFormat::Video => vec!["--merge-output-format".into(), "mp4".into()],
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaFormat::Audio => write!(f, "audio"),
            MediaFormat::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" | "mp3" => Ok(MediaFormat::Audio),
            "video" | "mp4" => Ok(MediaFormat::Video),
            other => Err(format!("unknown format: {}", other)),
        }
    }
}

/// A client's download request
///
/// Built only by the request validator: `url` has already been restricted to the
/// allowed hosts and stripped of markup. The core trusts it as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Validated absolute media URL
    pub url: String,
    /// Requested media kind
    pub format: MediaFormat,
}

impl DownloadRequest {
    /// Create a new request from already-validated parts
    pub fn new(url: impl Into<String>, format: MediaFormat) -> Self {
        Self {
            url: url.into(),
            format,
        }
    }
}

/// One progress report parsed from the worker's output
///
/// Percentages are not required to be monotonic: a fresh invocation or a
/// sub-download restart may report lower values than before.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressEvent {
    /// Completion percentage in `0.0..=100.0`
    pub percentage: f64,
}

impl ProgressEvent {
    /// Create a progress event
    pub fn new(percentage: f64) -> Self {
        Self { percentage }
    }
}

/// Terminal result of a download job
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobResult {
    /// The worker produced the file
    Completed {
        /// Public path of the produced file, relative to the server root
        file: String,
    },
    /// The job failed
    Failed {
        /// Failure message shown to the client
        message: String,
    },
}

/// Messages pushed to the client over the event stream
///
/// Serialized as exactly one of:
/// - `{ "progress": 42.5 }`
/// - `{ "status": "completed", "file": "downloads/1700000000000.mp4" }`
/// - `{ "error": "..." }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobEvent {
    /// Progress update
    Progress {
        /// Completion percentage
        progress: f64,
    },
    /// Terminal success
    Completed {
        /// Always `"completed"`
        status: String,
        /// Public path of the produced file
        file: String,
    },
    /// Terminal failure
    Error {
        /// Failure message
        error: String,
    },
}

impl JobEvent {
    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress { .. })
    }
}

impl From<ProgressEvent> for JobEvent {
    fn from(event: ProgressEvent) -> Self {
        JobEvent::Progress {
            progress: event.percentage,
        }
    }
}

impl From<JobResult> for JobEvent {
    fn from(result: JobResult) -> Self {
        match result {
            JobResult::Completed { file } => JobEvent::Completed {
                status: "completed".to_string(),
                file,
            },
            JobResult::Failed { message } => JobEvent::Error { error: message },
        }
    }
}

/// Estimated size of the media a request would download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SizeEstimate {
    /// Estimated size in bytes, if the worker reported one
    pub bytes: Option<u64>,
    /// Whether any part of the estimate came from an approximate size
    pub approximate: bool,
}
