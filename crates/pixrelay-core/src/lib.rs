pub mod config;
pub mod error;
pub mod http;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::{ConfigError, Retryable, TransportError};
pub use retry::RetryPolicy;
pub use types::{DownloadedFile, MessageKey, PhotoEvent};
