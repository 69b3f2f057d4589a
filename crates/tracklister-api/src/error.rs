// SPDX-License-Identifier: GPL-3.0-or-later
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracklister_application::{ProcessError, ResolveError};
use utoipa::ToSchema;

pub const GENERIC_FAILURE: &str = "Failed to process video. The link might be broken or restricted.";
pub const INVALID_QUERY: &str = "Invalid query parameters";

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

/// A failure as reported to HTTP clients.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: &'static str,
}

impl ApiError {
    pub fn bad_request(detail: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail,
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: GENERIC_FAILURE,
        }
    }
}

impl From<&ProcessError> for ApiError {
    fn from(error: &ProcessError) -> Self {
        let (status, detail) = match error {
            ProcessError::MissingUrl => (StatusCode::BAD_REQUEST, "URL is required"),
            ProcessError::Resolve(ResolveError::TimedOut) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Processing timed out for both original and cleaned URL.",
            ),
            ProcessError::Resolve(ResolveError::TimedOutUnsanitizable) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Processing timed out and URL could not be sanitized.",
            ),
            ProcessError::Resolve(ResolveError::ExtractionFailed(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
            }
            ProcessError::Resolve(ResolveError::RetryFailed(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process video after retrying without playlist parameter.",
            ),
        };
        Self { status, detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail.to_string(),
            }),
        )
            .into_response()
    }
}
