// SPDX-License-Identifier: GPL-3.0-or-later
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use tracklister_application::{AppState, ProcessError, Tracklist};
use tracklister_domain::TrackEntry;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorResponse, INVALID_QUERY};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProcessQuery {
    /// The URL of the music video or track.
    pub url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    pub time: String,
    pub title: String,
}

impl From<TrackEntry> for TrackResponse {
    fn from(value: TrackEntry) -> Self {
        Self {
            time: value.time,
            title: value.title,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessResponse {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub media_type: String,
    pub tracks: Vec<TrackResponse>,
}

impl From<Tracklist> for ProcessResponse {
    fn from(value: Tracklist) -> Self {
        Self {
            title: value.title,
            media_type: value.media_type.label().to_string(),
            tracks: value.tracks.into_iter().map(TrackResponse::from).collect(),
        }
    }
}

/// Extract the tracklist of a media URL.
///
/// Timestamped lines in the description are used when present. Otherwise a
/// short media file is identified acoustically, and as a last resort the
/// media title becomes the only track.
#[utoipa::path(
    get,
    path = "/process",
    params(ProcessQuery),
    responses(
        (status = 200, description = "Tracklist extracted", body = ProcessResponse),
        (status = 400, description = "No URL supplied or malformed query", body = ErrorResponse),
        (status = 500, description = "Metadata extraction failed", body = ErrorResponse),
        (status = 504, description = "Metadata extraction timed out", body = ErrorResponse)
    ),
    tag = "tracklist"
)]
pub async fn process(
    State(state): State<AppState>,
    query: Result<Query<ProcessQuery>, QueryRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        warn!(target: "api", error = %rejection, "rejected process query");
        ApiError::bad_request(INVALID_QUERY)
    })?;
    let url = query.url.unwrap_or_default();
    match state.service.process(&url).await {
        Ok(tracklist) => Ok(Json(tracklist.into())),
        Err(err) => {
            match &err {
                ProcessError::MissingUrl => warn!(target: "api", "process called without a url"),
                ProcessError::Resolve(cause) => {
                    error!(target: "api", url = %url, error = %cause, "processing failed")
                }
            }
            Err(ApiError::from(&err))
        }
    }
}
