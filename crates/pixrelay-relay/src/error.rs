use pixrelay_core::TransportError;

/// Failure of one relayed update. Reply failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("download failed: {0}")]
    Download(#[source] TransportError),

    #[error("upload failed: {0}")]
    Upload(#[source] TransportError),

    #[error("relay task aborted before completion")]
    Aborted,
}

impl RelayError {
    /// Short error code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Download(e) | RelayError::Upload(e) => e.code(),
            RelayError::Aborted => "ABORTED",
        }
    }
}
