//! Thin Bot API client: a reqwest client plus the settings every call shares.

use std::fmt;
use std::time::Duration;

use pixrelay_core::config::{HttpConfig, TelegramConfig};
use pixrelay_core::http::build_client;
use pixrelay_core::RetryPolicy;

use crate::error::TelegramError;

#[derive(Clone)]
pub struct TelegramClient {
    pub(crate) http: reqwest::Client,
    pub(crate) api_base_url: String,
    pub(crate) bot_token: String,
    pub(crate) timeout: Duration,
    pub(crate) retry: RetryPolicy,
    pub(crate) max_download_bytes: u64,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base_url", &self.api_base_url)
            .field("bot_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("max_download_bytes", &self.max_download_bytes)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(
        api_base_url: impl Into<String>,
        bot_token: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
        max_download_bytes: u64,
    ) -> Result<Self, TelegramError> {
        let bot_token = bot_token.into();
        if bot_token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }
        Ok(Self {
            http: build_client(timeout)?,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            bot_token,
            timeout,
            retry,
            max_download_bytes,
        })
    }

    pub fn from_config(telegram: &TelegramConfig, http: &HttpConfig) -> Result<Self, TelegramError> {
        Self::new(
            telegram.api_base_url.clone(),
            telegram.bot_token.clone(),
            Duration::from_millis(http.request_timeout_ms),
            RetryPolicy::from_config(http),
            http.max_upload_bytes,
        )
    }

    /// `{api}/bot<token>/<method>`
    pub(crate) fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.bot_token, method)
    }

    /// `{api}/file/bot<token>/<file_path>`
    pub(crate) fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_base_url,
            self.bot_token,
            file_path.trim_start_matches('/')
        )
    }
}
