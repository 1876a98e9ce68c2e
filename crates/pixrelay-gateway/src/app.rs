use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use pixrelay_core::config::MAX_WEBHOOK_BODY_BYTES;
use pixrelay_relay::Relay;

/// Shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub relay: Relay,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`; unchecked when `None`.
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(relay: Relay, webhook_secret: Option<String>) -> Self {
        Self {
            relay,
            webhook_secret,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(crate::http::health::health_handler))
        .route(
            "/telegram/webhook",
            post(crate::http::webhook::telegram_webhook_handler),
        )
        .fallback(crate::http::health::not_found_handler)
        .method_not_allowed_fallback(crate::http::health::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
