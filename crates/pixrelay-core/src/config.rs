use std::fmt;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_CONFIG_PATH: &str = "pixrelay.toml";
pub const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";
pub const DEFAULT_UPLOAD_PATH: &str = "/upload";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024; // 20 MiB, Bot API download ceiling
pub const MAX_WEBHOOK_BODY_BYTES: usize = 512 * 1024;

/// Top-level config (pixrelay.toml + PIXRELAY_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub imgbed: ImgBedConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Public URL Telegram should deliver updates to. Only `webhook set` needs it.
    pub webhook_url: Option<String>,
    /// Expected value of `X-Telegram-Bot-Api-Secret-Token`. Unchecked when absent.
    pub webhook_secret: Option<String>,
    /// Channel chat ids whose posts are relayed. Accepts a TOML list or a
    /// comma-separated string (handy for env overrides).
    #[serde(deserialize_with = "chat_id_list")]
    pub allowed_chat_ids: Vec<String>,
    #[serde(default = "default_telegram_api_base_url")]
    pub api_base_url: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("webhook_url", &self.webhook_url)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
            .field("allowed_chat_ids", &self.allowed_chat_ids)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ImgBedConfig {
    pub base_url: String,
    pub upload_token: String,
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
}

impl fmt::Debug for ImgBedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgBedConfig")
            .field("base_url", &self.base_url)
            .field("upload_token", &"[REDACTED]")
            .field("upload_path", &self.upload_path)
            .finish()
    }
}

impl ImgBedConfig {
    /// Full upload endpoint: base URL joined with the upload path.
    pub fn upload_url(&self) -> String {
        if self.upload_path.starts_with('/') {
            format!("{}{}", self.base_url, self.upload_path)
        } else {
            format!("{}/{}", self.base_url, self.upload_path)
        }
    }
}

/// Outbound HTTP behaviour shared by every collaborator call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Post the hosted URL back into the channel (default: true).
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// Reply text. `{url}` is substituted; without it the URL is appended.
    pub template: Option<String>,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            template: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DedupConfig {
    #[serde(default)]
    pub backend: DedupBackend,
}

/// Storage backend for the idempotency cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DedupBackend {
    #[default]
    Memory,
    Redis,
}

impl DedupBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupBackend::Memory => "memory",
            DedupBackend::Redis => "redis",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
    /// One JSON object per line (default) or the human-readable formatter.
    #[serde(default = "bool_true")]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            json: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_telegram_api_base_url() -> String {
    DEFAULT_TELEGRAM_API_BASE_URL.to_string()
}
fn default_upload_path() -> String {
    DEFAULT_UPLOAD_PATH.to_string()
}
fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
fn default_retry_max_attempts() -> u32 {
    DEFAULT_RETRY_MAX_ATTEMPTS
}
fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}
fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChatIdEntry {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChatIdList {
    One(ChatIdEntry),
    Many(Vec<ChatIdEntry>),
}

/// Env overrides arrive as a single value (`"-100123,-100456"` or a bare
/// integer) while TOML usually carries a list; both end up as trimmed strings.
fn chat_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match ChatIdList::deserialize(deserializer)? {
        ChatIdList::One(entry) => vec![entry],
        ChatIdList::Many(entries) => entries,
    };

    Ok(entries
        .into_iter()
        .flat_map(|entry| match entry {
            ChatIdEntry::Text(s) => s
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect::<Vec<_>>(),
            ChatIdEntry::Number(n) => vec![n.to_string()],
        })
        .collect())
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn require_non_empty(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn require_min(key: &'static str, value: u64, min: u64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be >= {min}"),
        });
    }
    Ok(())
}

impl RelayConfig {
    /// Load config from a TOML file with PIXRELAY_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `PIXRELAY_HTTP__RETRY_MAX_ATTEMPTS=5` or
    /// `PIXRELAY_TELEGRAM__ALLOWED_CHAT_IDS=-100123,-100456`.
    /// A missing file is not an error; env vars alone may carry the config.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        let config: RelayConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PIXRELAY_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        config.validated()
    }

    /// Check required values and ranges, and normalize URLs and blanks.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        require_non_empty("telegram.bot_token", &self.telegram.bot_token)?;
        require_non_empty("imgbed.base_url", &self.imgbed.base_url)?;
        require_non_empty("imgbed.upload_token", &self.imgbed.upload_token)?;
        if self.telegram.allowed_chat_ids.is_empty() {
            return Err(ConfigError::Invalid {
                key: "telegram.allowed_chat_ids",
                reason: "at least one chat id is required".to_string(),
            });
        }
        require_min("server.port", u64::from(self.server.port), 1)?;
        require_min(
            "http.request_timeout_ms",
            self.http.request_timeout_ms,
            MIN_REQUEST_TIMEOUT_MS,
        )?;
        require_min(
            "http.retry_max_attempts",
            u64::from(self.http.retry_max_attempts),
            1,
        )?;
        require_min("http.max_upload_bytes", self.http.max_upload_bytes, 1)?;

        self.telegram.api_base_url = normalize_base_url(&self.telegram.api_base_url);
        self.imgbed.base_url = normalize_base_url(&self.imgbed.base_url);
        if self.imgbed.upload_path.trim().is_empty() {
            self.imgbed.upload_path = default_upload_path();
        }
        self.telegram.webhook_secret = non_blank(self.telegram.webhook_secret.take());
        self.telegram.webhook_url = non_blank(self.telegram.webhook_url.take());
        self.reply.template = non_blank(self.reply.template.take());

        Ok(self)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const MINIMAL: &str = r#"
        [telegram]
        bot_token = "123:abc"
        allowed_chat_ids = ["-100123"]

        [imgbed]
        base_url = "https://img.example/"
        upload_token = "upload-secret"
    "#;

    #[test]
    fn minimal_file_fills_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            let cfg = RelayConfig::load(None).map_err(|e| e.to_string())?;

            assert_eq!(cfg.server.port, DEFAULT_PORT);
            assert_eq!(cfg.telegram.api_base_url, DEFAULT_TELEGRAM_API_BASE_URL);
            assert_eq!(cfg.imgbed.base_url, "https://img.example");
            assert_eq!(cfg.imgbed.upload_path, "/upload");
            assert_eq!(cfg.http.retry_max_attempts, 3);
            assert_eq!(cfg.http.request_timeout_ms, 10_000);
            assert_eq!(cfg.http.max_upload_bytes, 20 * 1024 * 1024);
            assert!(cfg.reply.enabled);
            assert!(cfg.reply.template.is_none());
            assert_eq!(cfg.dedup.backend, DedupBackend::Memory);
            assert_eq!(cfg.log.level, LogLevel::Info);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            jail.set_env("PIXRELAY_HTTP__RETRY_MAX_ATTEMPTS", "5");
            jail.set_env("PIXRELAY_REPLY__ENABLED", "false");
            jail.set_env("PIXRELAY_DEDUP__BACKEND", "redis");
            let cfg = RelayConfig::load(None).map_err(|e| e.to_string())?;

            assert_eq!(cfg.http.retry_max_attempts, 5);
            assert!(!cfg.reply.enabled);
            assert_eq!(cfg.dedup.backend, DedupBackend::Redis);
            Ok(())
        });
    }

    #[test]
    fn comma_separated_chat_ids_from_env() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            jail.set_env("PIXRELAY_TELEGRAM__ALLOWED_CHAT_IDS", "-100123, -100456,");
            let cfg = RelayConfig::load(None).map_err(|e| e.to_string())?;

            assert_eq!(cfg.telegram.allowed_chat_ids, vec!["-100123", "-100456"]);
            Ok(())
        });
    }

    #[test]
    fn numeric_chat_ids_are_stringified() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "relay.toml",
                r#"
                [telegram]
                bot_token = "t"
                allowed_chat_ids = [-100123, "@mychannel"]

                [imgbed]
                base_url = "https://img.example"
                upload_token = "u"
                "#,
            )?;
            let cfg = RelayConfig::load(Some("relay.toml")).map_err(|e| e.to_string())?;

            assert_eq!(cfg.telegram.allowed_chat_ids, vec!["-100123", "@mychannel"]);
            Ok(())
        });
    }

    #[test]
    fn empty_allow_list_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            jail.set_env("PIXRELAY_TELEGRAM__ALLOWED_CHAT_IDS", " , ");
            let err = RelayConfig::load(None).unwrap_err();

            assert!(err.to_string().contains("telegram.allowed_chat_ids"));
            Ok(())
        });
    }

    #[test]
    fn zero_retry_attempts_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            jail.set_env("PIXRELAY_HTTP__RETRY_MAX_ATTEMPTS", "0");
            let err = RelayConfig::load(None).unwrap_err();

            assert!(err.to_string().contains("http.retry_max_attempts"));
            Ok(())
        });
    }

    #[test]
    fn timeout_below_floor_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            jail.set_env("PIXRELAY_HTTP__REQUEST_TIMEOUT_MS", "50");
            let err = RelayConfig::load(None).unwrap_err();

            assert!(err.to_string().contains(">= 100"));
            Ok(())
        });
    }

    #[test]
    fn missing_bot_token_fails_to_load() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "pixrelay.toml",
                r#"
                [telegram]
                allowed_chat_ids = ["-100123"]

                [imgbed]
                base_url = "https://img.example"
                upload_token = "u"
                "#,
            )?;
            let err = RelayConfig::load(None).unwrap_err();

            assert!(matches!(err, ConfigError::Load(_)));
            Ok(())
        });
    }

    #[test]
    fn unknown_dedup_backend_fails_to_load() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            jail.set_env("PIXRELAY_DEDUP__BACKEND", "sqlite");

            assert!(RelayConfig::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn blank_template_is_treated_as_absent() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            jail.set_env("PIXRELAY_REPLY__TEMPLATE", "   ");
            let cfg = RelayConfig::load(None).map_err(|e| e.to_string())?;

            assert!(cfg.reply.template.is_none());
            Ok(())
        });
    }

    #[test]
    fn debug_output_redacts_credentials() {
        Jail::expect_with(|jail| {
            jail.create_file("pixrelay.toml", MINIMAL)?;
            let cfg = RelayConfig::load(None).map_err(|e| e.to_string())?;
            let rendered = format!("{cfg:?}");

            assert!(!rendered.contains("123:abc"));
            assert!(!rendered.contains("upload-secret"));
            assert!(rendered.contains("[REDACTED]"));
            Ok(())
        });
    }

    #[test]
    fn upload_url_joins_path_with_single_slash() {
        let mut imgbed = ImgBedConfig {
            base_url: "https://img.example".to_string(),
            upload_token: "u".to_string(),
            upload_path: "/upload".to_string(),
        };
        assert_eq!(imgbed.upload_url(), "https://img.example/upload");

        imgbed.upload_path = "api/upload".to_string();
        assert_eq!(imgbed.upload_url(), "https://img.example/api/upload");
    }
}
