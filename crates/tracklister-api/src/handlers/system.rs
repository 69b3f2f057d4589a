// SPDX-License-Identifier: GPL-3.0-or-later
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: &'static str,
    pub endpoints: Vec<&'static str>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness banner listing the public endpoints.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Backend is running", body = StatusResponse)
    ),
    tag = "system"
)]
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "Backend is running!",
        endpoints: vec!["/process", "/"],
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
