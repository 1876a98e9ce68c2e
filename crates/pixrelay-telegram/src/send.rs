//! Channel replies via `sendMessage`.
//!
//! Plain text only: a hosted URL must survive unescaped, so no parse mode is
//! set. Link previews stay enabled so the channel shows the image.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use pixrelay_core::http::{map_send_error, truncate_text, ERROR_BODY_MAX_CHARS};
use pixrelay_core::traits::ChannelReplier;
use pixrelay_core::TransportError;

use crate::client::TelegramClient;

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
}

impl TelegramClient {
    /// Send `text` to `chat_id`. Non-2xx (retried for 5xx/429) and
    /// `ok:false` answers are errors.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TransportError> {
        let started = Instant::now();
        let url = self.method_url("sendMessage");
        let url = url.as_str();
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": false,
        });
        let body = &body;

        self.retry
            .run("telegram_send_message", move |_| async move {
                let resp = self
                    .http
                    .post(url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| map_send_error(url, self.timeout, e))?;

                let status = resp.status();
                let raw = resp
                    .text()
                    .await
                    .map_err(|e| map_send_error(url, self.timeout, e))?;

                if !status.is_success() {
                    return Err(TransportError::Status {
                        context: "Telegram sendMessage",
                        status: status.as_u16(),
                        body: truncate_text(&raw, ERROR_BODY_MAX_CHARS),
                    });
                }

                match serde_json::from_str::<SendMessageResponse>(&raw) {
                    Ok(parsed) if parsed.ok => Ok(()),
                    _ => Err(TransportError::InvalidResponse {
                        context: "Telegram sendMessage",
                        body: truncate_text(&raw, ERROR_BODY_MAX_CHARS),
                    }),
                }
            })
            .await?;

        info!(
            chat_id,
            cost_ms = started.elapsed().as_millis() as u64,
            "telegram channel reply sent"
        );
        Ok(())
    }
}

#[async_trait]
impl ChannelReplier for TelegramClient {
    async fn reply(&self, chat_id: &str, text: &str) -> Result<(), TransportError> {
        self.send_message(chat_id, text).await
    }
}
