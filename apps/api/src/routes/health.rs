use axum::Json;
use serde_json::{json, Value};

/// GET /api/health/
/// Liveness marker with the service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "JobMailer API is running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
