use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use pixrelay_core::config::{LogConfig, RelayConfig};
use pixrelay_imgbed::ImgBedClient;
use pixrelay_relay::{Relay, RelaySettings};
use pixrelay_telegram::{TelegramClient, TelegramError};

mod app;
mod cli;
mod http;

use cli::{Cli, Command, WebhookAction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // config path: --config > PIXRELAY_CONFIG env > ./pixrelay.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("PIXRELAY_CONFIG").ok());
    let config = RelayConfig::load(config_path.as_deref())?;
    init_tracing(&config.log);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Webhook { action } => webhook(&config, action).await,
    }
}

/// `RUST_LOG` wins over `log.level`; `log.json` picks the formatter.
fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log.level.as_filter()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().flatten_event(true).init();
    } else {
        builder.init();
    }
}

async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    // redis is rejected here, before the port is bound
    let store = pixrelay_dedup::build_store(config.dedup.backend)?;
    let telegram = Arc::new(TelegramClient::from_config(&config.telegram, &config.http)?);
    let imgbed = Arc::new(ImgBedClient::from_config(&config.imgbed, &config.http)?);

    let relay = Relay::new(
        RelaySettings::from_config(&config),
        store,
        telegram.clone(),
        imgbed,
        telegram,
    );
    let state = Arc::new(app::AppState::new(
        relay,
        config.telegram.webhook_secret.clone(),
    ));
    let router = app::build_router(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        allowed_chats = config.telegram.allowed_chat_ids.len(),
        dedup_backend = config.dedup.backend.as_str(),
        reply_enabled = config.reply.enabled,
        secret_token = config.telegram.webhook_secret.is_some(),
        "pixrelay gateway listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("pixrelay gateway stopped");
    Ok(())
}

async fn webhook(config: &RelayConfig, action: WebhookAction) -> anyhow::Result<()> {
    let client = TelegramClient::from_config(&config.telegram, &config.http)?;
    let result = match action {
        WebhookAction::Set => {
            let url = config
                .telegram
                .webhook_url
                .as_deref()
                .ok_or(TelegramError::NoWebhookUrl)?;
            info!(webhook_url = %url, "registering telegram webhook");
            client
                .set_webhook(url, config.telegram.webhook_secret.as_deref())
                .await?
        }
        WebhookAction::Info => client.get_webhook_info().await?,
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix. In-flight requests finish first.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM; Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C; running until killed");
            std::future::pending::<()>().await;
        }
    }
    info!("shutdown signal received");
}
