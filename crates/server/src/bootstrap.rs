use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use freshcut_core::config::{AppConfig, ConfigError, LoadOptions};
use freshcut_core::polls::PollConfig;
use freshcut_discord::channel::NoopChannelApi;
use freshcut_discord::events::{
    ComponentInteractionHandler, EventDispatcher, MessageCreatedHandler, SlashCommandHandler,
};
use freshcut_discord::gateway::{GatewayRunner, NoopGatewayTransport, ReconnectPolicy};
use freshcut_discord::reminders::ReminderService;
use freshcut_discord::service::BotService;

use crate::gcal::GoogleCalendarSource;
use crate::wiki::HttpPageFetcher;

pub struct Application {
    pub config: AppConfig,
    pub gateway_runner: GatewayRunner,
    /// Present only when a calendar token is configured.
    pub reminder_service: Option<ReminderService<NoopChannelApi, GoogleCalendarSource>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let fetcher = Arc::new(HttpPageFetcher::new().map_err(BootstrapError::HttpClient)?);
    // The channel REST client rides on the gateway transport; until one is
    // wired the noop stands in and every flow stays exercisable in tests.
    let channel = Arc::new(NoopChannelApi);

    let poll_config =
        PollConfig { scan_limit: config.polls.scan_limit, ..PollConfig::default() };

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(BotService::new(
        channel.clone(),
        fetcher.clone(),
        config.wiki.base_url.clone(),
        poll_config.clone(),
    )));
    dispatcher.register(MessageCreatedHandler::new(channel.clone()));
    dispatcher.register(ComponentInteractionHandler::new(BotService::new(
        channel.clone(),
        fetcher,
        config.wiki.base_url.clone(),
        poll_config,
    )));
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        handler_count = dispatcher.handler_count(),
        "event dispatcher wired"
    );

    let reminder_service = config.calendar.api_token.clone().map(|token: SecretString| {
        info!(
            event_name = "system.bootstrap.calendar_enabled",
            target_count = config.reminders.len(),
            "calendar reminders enabled"
        );
        ReminderService::new(
            channel.clone(),
            Arc::new(GoogleCalendarSource::new(config.calendar.calendar_id.clone(), token)),
            config.reminders.clone(),
            config.calendar.attendee_names.clone(),
        )
    });

    let gateway_runner = GatewayRunner::new(
        Arc::new(NoopGatewayTransport),
        dispatcher,
        ReconnectPolicy::default(),
    );

    Ok(Application { config, gateway_runner, reminder_service })
}
