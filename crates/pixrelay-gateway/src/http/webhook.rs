//! Telegram webhook ingress: POST /telegram/webhook.
//!
//! Telegram redelivers any update that is not answered with 2xx, so every
//! update that cannot be relayed on principle (wrong chat, no photo, garbage
//! shape) still gets `200 {ok:true, ignored:true}`. Only a failed download or
//! upload answers 500, which makes Telegram retry later.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use pixrelay_relay::RelayOutcome;

use crate::app::AppState;

/// Header Telegram sets when the webhook was registered with a `secret_token`.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

type ApiError = (StatusCode, Json<Value>);

pub async fn telegram_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if let Some(expected) = state.webhook_secret.as_deref() {
        verify_secret_token(&headers, expected).map_err(|reason| {
            warn!(reason, "telegram webhook authentication failed");
            error_response(StatusCode::UNAUTHORIZED, "unauthorized")
        })?;
    }

    let update: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, bytes = body.len(), "invalid JSON in telegram webhook body");
        error_response(StatusCode::BAD_REQUEST, "Invalid JSON payload")
    })?;

    match state.relay.handle_update(&update).await {
        Ok(RelayOutcome::Ignored) => Ok(Json(json!({"ok": true, "ignored": true}))),
        Ok(RelayOutcome::Deduplicated { url }) => {
            Ok(Json(json!({"ok": true, "dedup": true, "url": url})))
        }
        Ok(RelayOutcome::Processed { url }) => Ok(Json(json!({"ok": true, "url": url}))),
        // Already logged with full context by the relay.
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &e.to_string(),
        )),
    }
}

fn verify_secret_token(headers: &HeaderMap, expected: &str) -> Result<(), &'static str> {
    let token = headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or("missing secret token header")?;

    if token == expected {
        Ok(())
    } else {
        Err("secret token mismatch")
    }
}

fn error_response(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({"ok": false, "error": message})))
}
