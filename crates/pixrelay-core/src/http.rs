//! Small helpers shared by the reqwest-based collaborators.

use std::time::Duration;

use serde_json::Value;

use crate::error::TransportError;

/// Response bodies quoted in errors are cut to this many characters.
pub const ERROR_BODY_MAX_CHARS: usize = 300;

/// Build a client whose every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pixrelay/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Classify a reqwest failure. Timeouts and transport failures are both
/// retryable; the distinction only matters for the log line.
pub fn map_send_error(url: &str, timeout: Duration, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: redact_bot_token(url),
            ms: timeout.as_millis() as u64,
        }
    } else {
        TransportError::Network {
            url: redact_bot_token(url),
            reason: err.without_url().to_string(),
        }
    }
}

/// Parse a body as JSON, yielding `None` for anything malformed or empty.
pub fn read_json_safe(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Bot API URLs embed the token (`/bot<token>/`); strip it before a URL
/// reaches an error message or a log line.
pub fn redact_bot_token(url: &str) -> String {
    let Some(start) = url.find("/bot") else {
        return url.to_string();
    };
    let token_start = start + "/bot".len();
    match url[token_start..].find('/') {
        Some(end) => format!("{}[REDACTED]{}", &url[..token_start], &url[token_start + end..]),
        None => format!("{}[REDACTED]", &url[..token_start]),
    }
}
