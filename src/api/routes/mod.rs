//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`] - Download event streams and size estimates
//! - [`system`] - Health and OpenAPI

use serde::{Deserialize, Serialize};

mod downloads;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use downloads::*;
pub use system::*;

/// Query parameters for GET /download and GET /estimate
///
/// Both fields are optional at the extractor level so that a missing value is
/// reported as a JSON `invalid_request` error.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct MediaQuery {
    /// Media page URL
    pub url: Option<String>,
    /// "audio", "video", "mp3" or "mp4"
    pub format: Option<String>,
}
