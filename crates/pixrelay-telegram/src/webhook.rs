//! Webhook registration with the Bot API (`setWebhook` / `getWebhookInfo`).
//!
//! Operator tooling, not part of request handling: no retry, and the raw API
//! answer is returned for printing.

use serde_json::{json, Value};

use pixrelay_core::http::{map_send_error, read_json_safe, truncate_text};
use pixrelay_core::TransportError;

use crate::client::TelegramClient;

/// Only channel posts are ever relayed; everything else is filtered at the source.
pub const ALLOWED_UPDATES: [&str; 2] = ["channel_post", "edited_channel_post"];

const API_ERROR_MAX_CHARS: usize = 500;

impl TelegramClient {
    /// Point Telegram at `webhook_url`. When `secret_token` is set Telegram
    /// echoes it in `X-Telegram-Bot-Api-Secret-Token` on every delivery.
    pub async fn set_webhook(
        &self,
        webhook_url: &str,
        secret_token: Option<&str>,
    ) -> Result<Value, TransportError> {
        let mut body = json!({
            "url": webhook_url,
            "allowed_updates": ALLOWED_UPDATES,
        });
        if let Some(secret) = secret_token {
            body["secret_token"] = json!(secret);
        }
        self.call_api("setWebhook", Some(&body)).await
    }

    pub async fn get_webhook_info(&self) -> Result<Value, TransportError> {
        self.call_api("getWebhookInfo", None).await
    }

    async fn call_api(&self, method: &str, body: Option<&Value>) -> Result<Value, TransportError> {
        let url = self.method_url(method);
        let request = match body {
            Some(body) => self.http.post(&url).json(body),
            None => self.http.get(&url),
        };

        let resp = request
            .send()
            .await
            .map_err(|e| map_send_error(&url, self.timeout, e))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| map_send_error(&url, self.timeout, e))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                context: "Telegram API",
                status: status.as_u16(),
                body: truncate_text(&text, API_ERROR_MAX_CHARS),
            });
        }

        read_json_safe(&text).ok_or_else(|| TransportError::InvalidResponse {
            context: "Telegram API",
            body: truncate_text(&text, API_ERROR_MAX_CHARS),
        })
    }
}
