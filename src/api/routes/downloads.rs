//! Download handlers: progress event stream and size estimate.

use super::MediaQuery;
use crate::api::AppState;
use crate::api::validation::validate_request;
use crate::error::Result;
use axum::{
    Json,
    extract::{Query, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// GET /download - Start a download and stream its progress
///
/// Each message is `data: <json>` followed by a blank line: zero or more
/// `{"progress": <float>}`, then exactly one `{"status": "completed", "file": ...}`
/// or `{"error": ...}`, after which the stream ends.
#[utoipa::path(
    get,
    path = "/download",
    tag = "downloads",
    params(
        ("url" = String, Query, description = "Media page URL on an allowed host"),
        ("format" = String, Query, description = "audio, video, mp3 or mp4")
    ),
    responses(
        (status = 200, description = "Download events (text/event-stream)", content_type = "text/event-stream"),
        (status = 400, description = "Invalid url or format", body = crate::error::ApiError)
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = std::result::Result<SseEvent, Infallible>>>> {
    let request = validate_request(
        query.url.as_deref(),
        query.format.as_deref(),
        &state.config.server.api.allowed_hosts,
    )?;

    let events = state.downloader.start_download(request);

    let sse_stream = ReceiverStream::new(events).filter_map(|event| {
        match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok(SseEvent::default().data(json_data))),
            Err(e) => {
                tracing::warn!("Failed to serialize event to JSON: {}", e);
                None
            }
        }
    });

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

/// GET /estimate - Estimate the download size without downloading
#[utoipa::path(
    get,
    path = "/estimate",
    tag = "downloads",
    params(
        ("url" = String, Query, description = "Media page URL on an allowed host"),
        ("format" = String, Query, description = "audio, video, mp3 or mp4")
    ),
    responses(
        (status = 200, description = "Estimated size", body = crate::types::SizeEstimate),
        (status = 400, description = "Invalid url or format", body = crate::error::ApiError),
        (status = 401, description = "The media requires a signed-in session", body = crate::error::ApiError),
        (status = 502, description = "The worker failed", body = crate::error::ApiError)
    )
)]
pub async fn estimate_size(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<crate::types::SizeEstimate>> {
    let request = validate_request(
        query.url.as_deref(),
        query.format.as_deref(),
        &state.config.server.api.allowed_hosts,
    )?;

    let estimate = state.downloader.estimate_size(&request).await?;
    Ok(Json(estimate))
}
