use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::DownloadedFile;

/// Fetches the bytes behind a Telegram `file_id`.
///
/// Implementations carry their own retry budget and enforce the configured
/// size ceiling.
#[async_trait]
pub trait PhotoDownloader: Send + Sync {
    async fn download(&self, file_id: &str) -> Result<DownloadedFile, TransportError>;
}

/// Pushes image bytes to the hosting service and returns the public URL.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, file: &DownloadedFile) -> Result<String, TransportError>;
}

/// Posts plain text into a channel.
#[async_trait]
pub trait ChannelReplier: Send + Sync {
    async fn reply(&self, chat_id: &str, text: &str) -> Result<(), TransportError>;
}
