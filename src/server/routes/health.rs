use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    success: bool,
    status: &'static str,
    version: &'static str,
}

/// Liveness check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
