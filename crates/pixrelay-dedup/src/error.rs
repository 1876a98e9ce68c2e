use thiserror::Error;

/// Errors that can occur while constructing a dedup store.
#[derive(Debug, Error)]
pub enum DedupError {
    /// The configured backend is recognised but has no implementation yet.
    ///
    /// Returned instead of silently falling back to memory, so a deployment
    /// that expects shared state across instances does not start without it.
    #[error("dedup backend '{backend}' is not implemented yet; use 'memory'")]
    Unimplemented { backend: &'static str },
}

pub type Result<T> = std::result::Result<T, DedupError>;
