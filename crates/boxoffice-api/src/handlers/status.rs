//! /version handler.

use axum::Json;
use serde::Serialize;

/// Version of the HTTP API, independent of the crate version.
pub const API_VERSION: &str = "1.0.0";

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

pub async fn handle_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: API_VERSION,
    })
}
