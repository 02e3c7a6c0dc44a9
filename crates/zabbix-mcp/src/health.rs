//! Liveness endpoint.
//!
//! `GET /health` answers as long as the process serves HTTP. It sits outside
//! the middleware stack and never touches the session registry.

use axum::Json;
use serde::{Deserialize, Serialize};

/// Liveness status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The server is running.
    Healthy,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
    })
}
