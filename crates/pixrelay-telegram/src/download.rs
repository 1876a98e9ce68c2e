//! Inbound media download for relayed channel photos.
//!
//! Resolves a `file_id` through `getFile` to a provider-side `file_path`, then
//! fetches the bytes from the file endpoint. Each hop carries its own retry
//! budget. Files above the configured ceiling are rejected without retry.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info};

use pixrelay_core::http::{map_send_error, truncate_text, ERROR_BODY_MAX_CHARS};
use pixrelay_core::traits::PhotoDownloader;
use pixrelay_core::{DownloadedFile, TransportError};

use crate::client::TelegramClient;

#[derive(Debug, Deserialize)]
struct GetFileResponse {
    ok: bool,
    result: Option<FileResult>,
}

#[derive(Debug, Deserialize)]
struct FileResult {
    file_path: Option<String>,
}

impl TelegramClient {
    /// `getFile`: map a `file_id` to the path used by the file endpoint.
    pub async fn get_file_path(&self, file_id: &str) -> Result<String, TransportError> {
        let url = self.method_url("getFile");
        let url = url.as_str();
        let body = serde_json::json!({ "file_id": file_id });
        let body = &body;

        self.retry
            .run("telegram_get_file", move |_| async move {
                let resp = self
                    .http
                    .post(url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| map_send_error(url, self.timeout, e))?;

                let status = resp.status();
                let text = resp
                    .text()
                    .await
                    .map_err(|e| map_send_error(url, self.timeout, e))?;

                if !status.is_success() {
                    return Err(TransportError::Status {
                        context: "Telegram getFile",
                        status: status.as_u16(),
                        body: truncate_text(&text, ERROR_BODY_MAX_CHARS),
                    });
                }

                serde_json::from_str::<GetFileResponse>(&text)
                    .ok()
                    .filter(|parsed| parsed.ok)
                    .and_then(|parsed| parsed.result)
                    .and_then(|result| result.file_path)
                    .filter(|path| !path.is_empty())
                    .ok_or_else(|| TransportError::InvalidResponse {
                        context: "Telegram getFile",
                        body: truncate_text(&text, ERROR_BODY_MAX_CHARS),
                    })
            })
            .await
    }

    /// Download the bytes behind `file_id`, enforcing the size ceiling.
    pub async fn download_file(&self, file_id: &str) -> Result<DownloadedFile, TransportError> {
        let started = Instant::now();
        let file_path = self.get_file_path(file_id).await?;
        debug!(file_id, file_path = %file_path, "telegram file path resolved");

        let url = self.file_url(&file_path);
        let url = url.as_str();
        let max = self.max_download_bytes;

        let (bytes, content_type) = self
            .retry
            .run("telegram_file_download", move |_| async move {
                let mut resp = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| map_send_error(url, self.timeout, e))?;

                let status = resp.status();
                if !status.is_success() {
                    let text = resp.text().await.unwrap_or_default();
                    return Err(TransportError::Status {
                        context: "Telegram file download",
                        status: status.as_u16(),
                        body: truncate_text(&text, ERROR_BODY_MAX_CHARS),
                    });
                }

                // Size guard before reading when the server announces a length.
                if let Some(announced) = resp.content_length() {
                    if announced > max {
                        return Err(TransportError::PayloadTooLarge {
                            size: announced,
                            max,
                        });
                    }
                }

                let content_type = resp
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                // Without an announced length the ceiling is enforced while reading.
                let mut bytes = Vec::new();
                while let Some(chunk) = resp
                    .chunk()
                    .await
                    .map_err(|e| map_send_error(url, self.timeout, e))?
                {
                    let size = (bytes.len() + chunk.len()) as u64;
                    if size > max {
                        return Err(TransportError::PayloadTooLarge { size, max });
                    }
                    bytes.extend_from_slice(&chunk);
                }

                Ok((bytes, content_type))
            })
            .await?;

        let size = bytes.len() as u64;

        info!(
            file_id,
            bytes = size,
            cost_ms = started.elapsed().as_millis() as u64,
            "telegram file downloaded"
        );

        Ok(DownloadedFile {
            bytes,
            content_type,
            file_path: Some(file_path),
        })
    }
}

#[async_trait]
impl PhotoDownloader for TelegramClient {
    async fn download(&self, file_id: &str) -> Result<DownloadedFile, TransportError> {
        self.download_file(file_id).await
    }
}
