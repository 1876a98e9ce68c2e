//! Webhook orchestration: parse, dedup, download, upload, record, reply.
//!
//! `handle_update` is the single entry point used by the HTTP layer. Once an
//! update is accepted the rest of the pipeline runs on its own task, so a
//! dropped inbound connection does not abandon an upload halfway and leave the
//! dedup store without the resulting URL.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use pixrelay_core::config::RelayConfig;
use pixrelay_core::traits::{ChannelReplier, ImageUploader, PhotoDownloader};
use pixrelay_core::PhotoEvent;
use pixrelay_dedup::DedupStore;
use pixrelay_telegram::{parse_update, update_id, ChatAllowList};

use crate::error::RelayError;
use crate::inflight::InflightLocks;
use crate::reply::render_reply_text;

/// Behaviour switches taken from configuration.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub allowed: ChatAllowList,
    pub reply_enabled: bool,
    pub reply_template: Option<String>,
}

impl RelaySettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            allowed: ChatAllowList::new(&config.telegram.allowed_chat_ids),
            reply_enabled: config.reply.enabled,
            reply_template: config.reply.template.clone(),
        }
    }
}

/// Result of one webhook delivery that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Not a photo post from an allowed channel.
    Ignored,
    /// The post was already relayed; `url` is the recorded hosted URL.
    Deduplicated { url: String },
    /// The photo is hosted at `url` (freshly uploaded or reused by file id).
    Processed { url: String },
}

impl RelayOutcome {
    /// Value of the `outcome` log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayOutcome::Ignored => "ignored",
            RelayOutcome::Deduplicated { .. } => "dedup_message",
            RelayOutcome::Processed { .. } => "processed",
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            RelayOutcome::Ignored => None,
            RelayOutcome::Deduplicated { url } | RelayOutcome::Processed { url } => Some(url),
        }
    }
}

/// Cheap to clone; all clones share the store, collaborators and lock table.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    settings: RelaySettings,
    store: Arc<dyn DedupStore>,
    downloader: Arc<dyn PhotoDownloader>,
    uploader: Arc<dyn ImageUploader>,
    replier: Arc<dyn ChannelReplier>,
    inflight: InflightLocks,
}

impl Relay {
    pub fn new(
        settings: RelaySettings,
        store: Arc<dyn DedupStore>,
        downloader: Arc<dyn PhotoDownloader>,
        uploader: Arc<dyn ImageUploader>,
        replier: Arc<dyn ChannelReplier>,
    ) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                settings,
                store,
                downloader,
                uploader,
                replier,
                inflight: InflightLocks::new(),
            }),
        }
    }

    /// Handle one raw webhook update.
    ///
    /// Malformed or irrelevant updates are `Ignored`, never an error. Only a
    /// failed download or upload yields `Err`, in which case nothing has been
    /// recorded and no reply was sent.
    pub async fn handle_update(&self, update: &Value) -> Result<RelayOutcome, RelayError> {
        let started = Instant::now();
        let update_id = update_id(update);

        let Some(event) = parse_update(update, &self.inner.settings.allowed) else {
            debug!(update_id, outcome = "ignored", "telegram update ignored");
            return Ok(RelayOutcome::Ignored);
        };

        let inner = Arc::clone(&self.inner);
        let task_event = event.clone();
        let result = match tokio::spawn(async move { inner.process(&task_event, update_id).await }).await
        {
            Ok(result) => result,
            Err(join_err) => {
                error!(update_id, error = %join_err, "relay task did not complete");
                Err(RelayError::Aborted)
            }
        };

        let cost_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(outcome @ RelayOutcome::Deduplicated { url }) => info!(
                update_id,
                chat_id = %event.chat_id,
                message_id = event.message_id,
                file_id = %event.file_id,
                uploaded_url = %url,
                cost_ms,
                outcome = outcome.as_str(),
                "telegram update dedup message hit"
            ),
            Ok(outcome @ RelayOutcome::Processed { url }) => info!(
                update_id,
                chat_id = %event.chat_id,
                message_id = event.message_id,
                file_id = %event.file_id,
                is_edited = event.is_edited,
                uploaded_url = %url,
                cost_ms,
                outcome = outcome.as_str(),
                "telegram update processed"
            ),
            Ok(RelayOutcome::Ignored) => {}
            Err(e) => error!(
                update_id,
                chat_id = %event.chat_id,
                message_id = event.message_id,
                file_id = %event.file_id,
                cost_ms,
                code = e.code(),
                error = %e,
                outcome = "failed",
                "telegram update failed"
            ),
        }

        result
    }
}

impl RelayInner {
    async fn process(&self, event: &PhotoEvent, update_id: Option<i64>) -> Result<RelayOutcome, RelayError> {
        let key = event.message_key();
        if let Some(url) = self.store.get_message_upload_url(key.as_str()) {
            return Ok(RelayOutcome::Deduplicated { url });
        }

        let _message_lock = self.inflight.acquire(format!("msg:{key}")).await;
        // A concurrent delivery of the same post may have finished while we waited.
        if let Some(url) = self.store.get_message_upload_url(key.as_str()) {
            return Ok(RelayOutcome::Deduplicated { url });
        }

        let url = self.resolve_hosted_url(event, update_id).await?;
        self.store.set_message_upload_url(key.as_str(), &url);

        if self.settings.reply_enabled {
            self.send_reply(event, &url, update_id).await;
        }

        Ok(RelayOutcome::Processed { url })
    }

    /// Hosted URL for the event's file: reused by `file_id` when known,
    /// otherwise downloaded, uploaded and recorded.
    async fn resolve_hosted_url(&self, event: &PhotoEvent, update_id: Option<i64>) -> Result<String, RelayError> {
        if let Some(url) = self.file_hit(event, update_id) {
            return Ok(url);
        }

        let _file_lock = self.inflight.acquire(format!("file:{}", event.file_id)).await;
        if let Some(url) = self.file_hit(event, update_id) {
            return Ok(url);
        }

        let file = self
            .downloader
            .download(&event.file_id)
            .await
            .map_err(RelayError::Download)?;
        let url = self.uploader.upload(&file).await.map_err(RelayError::Upload)?;
        self.store.set_file_upload_url(&event.file_id, &url);
        Ok(url)
    }

    fn file_hit(&self, event: &PhotoEvent, update_id: Option<i64>) -> Option<String> {
        let url = self.store.get_file_upload_url(&event.file_id)?;
        info!(
            update_id,
            chat_id = %event.chat_id,
            message_id = event.message_id,
            file_id = %event.file_id,
            uploaded_url = %url,
            outcome = "dedup_file",
            "telegram update dedup file hit"
        );
        Some(url)
    }

    /// Reply failures are logged and swallowed; the image is already hosted.
    async fn send_reply(&self, event: &PhotoEvent, url: &str, update_id: Option<i64>) {
        let text = render_reply_text(url, self.settings.reply_template.as_deref());
        if let Err(e) = self.replier.reply(&event.chat_id, &text).await {
            warn!(
                update_id,
                chat_id = %event.chat_id,
                message_id = event.message_id,
                file_id = %event.file_id,
                uploaded_url = %url,
                code = e.code(),
                error = %e,
                "telegram channel reply failed"
            );
        }
    }
}
