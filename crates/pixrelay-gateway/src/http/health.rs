use axum::{http::StatusCode, http::Uri, Json};
use serde_json::{json, Value};

/// GET /healthz: liveness probe.
pub async fn health_handler() -> Json<Value> {
    Json(json!({"ok": true}))
}

/// Fallback for every unmatched route.
pub async fn not_found_handler(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"ok": false, "error": format!("Not Found: {}", uri.path())})),
    )
}
