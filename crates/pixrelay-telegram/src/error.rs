/// Errors produced while setting up the Telegram client.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no bot token configured")]
    NoToken,

    #[error("no webhook URL configured (telegram.webhook_url)")]
    NoWebhookUrl,
}
