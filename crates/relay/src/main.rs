//! Service entry point: load config, wire the collaborators, serve webhooks.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use firehose::{ChannelRouter, Dispatcher, Notifier, OutboundMessage, Severity, UserDirectory};
use phab::PhabClient;
use relay::server::{build_router, AppState};
use relay::Config;
use slack::SlackClient;

#[derive(Parser)]
#[command(
    name = "relay-server",
    about = "Relays Phabricator firehose events to Slack"
)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, env = "RELAY_CONFIG", default_value = "/etc/firehose-relay.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let router = Arc::new(ChannelRouter::new(config.channels.clone())?);

    let phab = PhabClient::new(&config.phabricator_url, &config.phabricator_token)?;
    phab.ping()
        .await
        .context("Phabricator is not reachable with the configured URL and token")?;

    let slack = Arc::new(SlackClient::new(
        &config.slack_token,
        router.default_channel(),
    )?);

    let directory = Arc::new(UserDirectory::new(
        phab.users().await?,
        &slack.users().await?,
    ));
    info!(users = directory.len(), "User directory built");

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(phab),
        slack.clone(),
        directory,
        router,
    ));

    let message = "Firehose relay started running.";
    info!("{message}");
    slack
        .notify(OutboundMessage::plain(message.to_string()).with_severity(Severity::Info))
        .await;

    let app = build_router(AppState { dispatcher });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Listening for firehose webhooks");

    axum::serve(listener, app).await.context("Server exited")?;
    Ok(())
}
