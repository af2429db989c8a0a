use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use galaxy_bot::dispatch::Bot;
use galaxy_bot::health;
use galaxy_common::{load_config, AppConfig, FileConfig};
use galaxy_core::{
    Cascade, CascadeSettings, Controller, ControllerSettings, GitHubDocument, MemorySessionStore,
    Publisher,
};

const RESTART_DELAY: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "galaxy-bot", about = "Files Telegram posts into the Galaxy bookmark page")]
struct Cli {
    /// Optional TOML file with classifier and conversation tunables
    #[arg(long, env = "GALAXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting galaxy-bot");

    let cli = Cli::parse();
    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!(config = %path.display(), "Loading config");
            load_config(path)?
        }
        None => FileConfig::default(),
    };
    let config = Arc::new(AppConfig::from_env()?);

    // Inference
    let mut inference = ai_client::InferenceClient::new(config.hf_token.clone());
    if let Some(base_url) = &config.inference_base_url {
        inference = inference.with_base_url(base_url.clone());
    }
    let cascade_settings = CascadeSettings::from(&file_config.classifier);
    tracing::info!(models = ?cascade_settings.models, "Classifier cascade configured");
    let cascade = Arc::new(Cascade::new(Arc::new(inference), cascade_settings));

    // Document store
    let github = github_client::GitHubClient::new(config.github_token.clone());
    let document = GitHubDocument::new(
        github,
        config.repo_name.clone(),
        config.file_path.clone(),
        config.branch.clone(),
    );
    let publisher = Arc::new(Publisher::new(Arc::new(document)));

    let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
        file_config.conversation.session_ttl_secs,
    )));
    let controller = Arc::new(Controller::new(
        cascade,
        publisher,
        sessions,
        ControllerSettings::from(&file_config.conversation),
    ));

    let telegram = telegram_client::TelegramClient::new(config.tg_token.clone());
    let bot = Bot::new(telegram, controller, config.clone());

    let port = config.port;
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            tracing::error!(error = %e, "Liveness endpoint failed");
        }
    });

    let bot_handle = tokio::spawn(async move {
        loop {
            match bot.run().await {
                Ok(()) => tracing::warn!("Polling loop exited"),
                Err(e) => tracing::error!(error = %e, "Polling loop failed"),
            }
            tracing::info!(delay_secs = RESTART_DELAY.as_secs(), "Restarting polling loop");
            tokio::time::sleep(RESTART_DELAY).await;
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
        _ = health_handle => tracing::warn!("Liveness task ended"),
        _ = bot_handle => tracing::warn!("Bot task ended"),
    }

    Ok(())
}
