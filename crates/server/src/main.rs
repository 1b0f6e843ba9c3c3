mod bootstrap;
mod gcal;
mod scheduler;
mod wiki;

use anyhow::Result;
use freshcut_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use freshcut_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    if let Some(reminder_service) = app.reminder_service {
        let hour_utc = app.config.calendar.reminder_hour_utc;
        tokio::spawn(async move {
            scheduler::run_daily(reminder_service, hour_utc).await;
        });
    }

    app.gateway_runner.start().await?;

    tracing::info!(
        event_name = "system.server.started",
        wiki_base_url = %app.config.wiki.base_url,
        reminder_targets = app.config.reminders.len(),
        "freshcut-server started"
    );
    wait_for_shutdown().await?;
    tracing::info!(event_name = "system.server.stopping", "freshcut-server stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
