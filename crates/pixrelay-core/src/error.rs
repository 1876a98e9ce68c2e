use thiserror::Error;

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(String),

    #[error("Invalid config {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failure of a single outbound HTTP call (Telegram Bot API or image host).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timeout after {ms}ms: {url}")]
    Timeout { url: String, ms: u64 },

    #[error("Request failed: {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("{context} HTTP {status}")]
    Status {
        context: &'static str,
        status: u16,
        body: String,
    },

    #[error("{context} invalid response: {body}")]
    InvalidResponse { context: &'static str, body: String },

    #[error("{context} invalid request: {reason}")]
    InvalidRequest {
        context: &'static str,
        reason: String,
    },

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },
}

impl TransportError {
    /// Short error code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Timeout { .. } => "TIMEOUT",
            TransportError::Network { .. } => "NETWORK",
            TransportError::Status { .. } => "HTTP_STATUS",
            TransportError::InvalidResponse { .. } => "INVALID_RESPONSE",
            TransportError::InvalidRequest { .. } => "INVALID_REQUEST",
            TransportError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
        }
    }

    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Decides whether a failed attempt may be repeated.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for TransportError {
    fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout { .. } | TransportError::Network { .. } => true,
            TransportError::Status { status, .. } => is_retryable_status(*status),
            TransportError::InvalidResponse { .. }
            | TransportError::InvalidRequest { .. }
            | TransportError::PayloadTooLarge { .. } => false,
        }
    }
}

/// 5xx and 429 are transient; every other status is an application answer.
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429
}
