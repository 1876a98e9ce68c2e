use serde::{Deserialize, Serialize};
use std::fmt;

/// A channel photo accepted for relaying, extracted from a raw Telegram update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEvent {
    pub chat_id: String,
    pub message_id: i64,
    pub file_id: String,
    /// Content-stable Telegram handle; empty when the update omits it.
    pub file_unique_id: String,
    pub is_edited: bool,
}

impl PhotoEvent {
    pub fn message_key(&self) -> MessageKey {
        MessageKey::new(&self.chat_id, self.message_id)
    }
}

/// Dedup key for one channel post: `<chat_id>:<message_id>`.
///
/// Stable across redeliveries and edits of the same post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKey(String);

impl MessageKey {
    pub fn new(chat_id: &str, message_id: i64) -> Self {
        Self(format!("{chat_id}:{message_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw bytes of a Telegram file plus the hints the uploader needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the file server, if any.
    pub content_type: Option<String>,
    /// Provider-side path from `getFile`, e.g. `photos/file_12.jpg`.
    pub file_path: Option<String>,
}
