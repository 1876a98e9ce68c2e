//! Idempotency cache for relayed photos.
//!
//! Two independent key spaces:
//! - message key (`<chat_id>:<message_id>`) → hosted URL, the source of truth
//!   for "this post has already been answered"
//! - Telegram `file_id` → hosted URL, so a forwarded or re-posted file is not
//!   uploaded twice
//!
//! Entries never expire. With several relay instances behind a load balancer
//! the guarantee is per instance only.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use pixrelay_core::config::DedupBackend;

use crate::error::{DedupError, Result};

/// Get/set access to both key spaces. Operations are synchronous and never
/// fail; `set_*` overwrites unconditionally, so callers only write a key once
/// per logical event.
pub trait DedupStore: Send + Sync {
    fn get_message_upload_url(&self, message_key: &str) -> Option<String>;
    fn set_message_upload_url(&self, message_key: &str, uploaded_url: &str);
    fn get_file_upload_url(&self, file_id: &str) -> Option<String>;
    fn set_file_upload_url(&self, file_id: &str, uploaded_url: &str);
}

/// Process-local store backed by two concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryDedupStore {
    message_to_url: DashMap<String, String>,
    file_id_to_url: DashMap<String, String>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of message keys recorded so far.
    pub fn message_count(&self) -> usize {
        self.message_to_url.len()
    }

    /// Number of file ids recorded so far.
    pub fn file_count(&self) -> usize {
        self.file_id_to_url.len()
    }
}

impl DedupStore for MemoryDedupStore {
    fn get_message_upload_url(&self, message_key: &str) -> Option<String> {
        self.message_to_url.get(message_key).map(|v| v.value().clone())
    }

    fn set_message_upload_url(&self, message_key: &str, uploaded_url: &str) {
        self.message_to_url
            .insert(message_key.to_string(), uploaded_url.to_string());
    }

    fn get_file_upload_url(&self, file_id: &str) -> Option<String> {
        self.file_id_to_url.get(file_id).map(|v| v.value().clone())
    }

    fn set_file_upload_url(&self, file_id: &str, uploaded_url: &str) {
        self.file_id_to_url
            .insert(file_id.to_string(), uploaded_url.to_string());
    }
}

/// Construct the store selected by configuration.
///
/// `redis` fails fast with [`DedupError::Unimplemented`].
pub fn build_store(backend: DedupBackend) -> Result<Arc<dyn DedupStore>> {
    match backend {
        DedupBackend::Memory => {
            info!(backend = backend.as_str(), "dedup store initialized");
            Ok(Arc::new(MemoryDedupStore::new()))
        }
        DedupBackend::Redis => Err(DedupError::Unimplemented {
            backend: backend.as_str(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_key_round_trip() {
        let store = MemoryDedupStore::new();
        assert!(store.get_message_upload_url("-100:1").is_none());

        store.set_message_upload_url("-100:1", "https://img.example/a.jpg");

        assert_eq!(
            store.get_message_upload_url("-100:1").as_deref(),
            Some("https://img.example/a.jpg")
        );
        assert_eq!(store.message_count(), 1);
    }

    #[test]
    fn file_id_mapping_round_trip() {
        let store = MemoryDedupStore::new();
        assert!(store.get_file_upload_url("file-1").is_none());

        store.set_file_upload_url("file-1", "https://img.example/x.jpg");

        assert_eq!(
            store.get_file_upload_url("file-1").as_deref(),
            Some("https://img.example/x.jpg")
        );
    }

    #[test]
    fn key_spaces_are_independent() {
        let store = MemoryDedupStore::new();
        store.set_message_upload_url("same", "https://img.example/m.jpg");

        assert!(store.get_file_upload_url("same").is_none());
        assert_eq!(store.file_count(), 0);
    }

    #[test]
    fn empty_string_is_distinct_from_absent() {
        let store = MemoryDedupStore::new();
        store.set_file_upload_url("file-empty", "");

        assert_eq!(store.get_file_upload_url("file-empty").as_deref(), Some(""));
        assert!(store.get_file_upload_url("file-other").is_none());
    }

    #[test]
    fn set_overwrites_existing_value() {
        let store = MemoryDedupStore::new();
        store.set_message_upload_url("k", "https://img.example/1.jpg");
        store.set_message_upload_url("k", "https://img.example/2.jpg");

        assert_eq!(store.message_count(), 1);
        assert_eq!(
            store.get_message_upload_url("k").as_deref(),
            Some("https://img.example/2.jpg")
        );
    }

    #[test]
    fn memory_backend_builds() {
        let store = build_store(DedupBackend::Memory).unwrap();
        store.set_message_upload_url("-100:9", "https://img.example/9.jpg");
        assert!(store.get_message_upload_url("-100:9").is_some());
    }

    #[test]
    fn redis_backend_fails_fast() {
        let err = build_store(DedupBackend::Redis).err().unwrap();
        assert!(matches!(err, DedupError::Unimplemented { backend: "redis" }));
        assert!(err.to_string().contains("not implemented"));
    }
}
