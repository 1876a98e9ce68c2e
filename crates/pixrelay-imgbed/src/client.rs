//! Multipart upload to the image host.
//!
//! One POST per attempt to `{base_url}{upload_path}` with a bearer token and a
//! single `file` part. The host answers with a path (or URL) that is joined
//! onto the base URL to form the public link.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::info;

use pixrelay_core::config::{HttpConfig, ImgBedConfig};
use pixrelay_core::http::{build_client, map_send_error, read_json_safe, truncate_text, ERROR_BODY_MAX_CHARS};
use pixrelay_core::traits::ImageUploader;
use pixrelay_core::{DownloadedFile, RetryPolicy, TransportError};

use crate::error::ImgBedError;
use crate::mime::{build_timestamp_filename, extension_for_mime, pick_upload_mime_type};
use crate::response::{join_url, pick_src};

const CONTEXT: &str = "ImgBed upload";

#[derive(Clone)]
pub struct ImgBedClient {
    http: reqwest::Client,
    base_url: String,
    upload_url: String,
    token: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl fmt::Debug for ImgBedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgBedClient")
            .field("base_url", &self.base_url)
            .field("upload_url", &self.upload_url)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ImgBedClient {
    pub fn new(
        base_url: impl Into<String>,
        upload_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ImgBedError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ImgBedError::MissingToken);
        }
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            upload_url: upload_url.into(),
            token,
            timeout,
            retry,
        })
    }

    pub fn from_config(imgbed: &ImgBedConfig, http: &HttpConfig) -> Result<Self, ImgBedError> {
        Self::new(
            imgbed.base_url.clone(),
            imgbed.upload_url(),
            imgbed.upload_token.clone(),
            Duration::from_millis(http.request_timeout_ms),
            RetryPolicy::from_config(http),
        )
    }

    /// Upload `file` and return its public URL.
    pub async fn upload_image(&self, file: &DownloadedFile) -> Result<String, TransportError> {
        let started = Instant::now();
        let mime = pick_upload_mime_type(file.content_type.as_deref(), file.file_path.as_deref());
        let filename = format!(
            "{}.{}",
            build_timestamp_filename(chrono::Local::now().naive_local()),
            extension_for_mime(&mime)
        );
        let url = self.upload_url.as_str();
        let mime = mime.as_str();
        let filename = filename.as_str();

        let uploaded_url = self
            .retry
            .run("imgbed_upload", move |_| async move {
                // A multipart body is consumed by the send, so every attempt builds its own.
                let part = Part::bytes(file.bytes.clone())
                    .file_name(filename.to_string())
                    .mime_str(mime)
                    .map_err(|e| TransportError::InvalidRequest {
                        context: CONTEXT,
                        reason: e.to_string(),
                    })?;
                let form = Form::new().part("file", part);

                let resp = self
                    .http
                    .post(url)
                    .bearer_auth(&self.token)
                    .multipart(form)
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
                        context: CONTEXT,
                        status: status.as_u16(),
                        body: truncate_text(&text, ERROR_BODY_MAX_CHARS),
                    });
                }

                read_json_safe(&text)
                    .as_ref()
                    .and_then(pick_src)
                    .map(|src| join_url(&self.base_url, src))
                    .ok_or_else(|| TransportError::InvalidResponse {
                        context: CONTEXT,
                        body: truncate_text(&text, ERROR_BODY_MAX_CHARS),
                    })
            })
            .await?;

        info!(
            bytes = file.bytes.len() as u64,
            uploaded_url = %uploaded_url,
            cost_ms = started.elapsed().as_millis() as u64,
            "imgbed upload succeeded"
        );

        Ok(uploaded_url)
    }
}

#[async_trait]
impl ImageUploader for ImgBedClient {
    async fn upload(&self, file: &DownloadedFile) -> Result<String, TransportError> {
        self.upload_image(file).await
    }
}
