use clap::{Parser, Subcommand};

/// Relay photos posted to Telegram channels to an image host.
#[derive(Debug, Parser)]
#[command(name = "pixrelay-gateway", version, about)]
pub struct Cli {
    /// Config file (default: $PIXRELAY_CONFIG, then ./pixrelay.toml)
    #[arg(long, short, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the webhook endpoint (default)
    Serve,
    /// Manage the Telegram webhook registration
    Webhook {
        #[command(subcommand)]
        action: WebhookAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum WebhookAction {
    /// Register telegram.webhook_url (and webhook_secret) with Telegram
    Set,
    /// Print Telegram's current webhook info
    Info,
}
