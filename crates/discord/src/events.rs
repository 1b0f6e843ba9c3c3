use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use freshcut_core::polls::RankingPolicy;

use crate::channel::{ChannelApi, ChannelError, NoopChannelApi};
use crate::commands::{
    BotCommandService, CommandParseError, CommandPayload, CommandRouteError, CommandRouter,
    NoopBotCommandService,
};
use crate::messages::OutboundMessage;

/// Reaction added to any message that mentions the bard's favorite critic.
pub const LEMON_EMOJI: &str = "🍋";
const LEMON_TRIGGERS: [&str; 2] = ["lermontov", "lairmontov"];

/// Component id of the refresh button on a results message. The ranking
/// mode rides in the component value.
pub const RESULTS_REFRESH_ACTION: &str = "poll.results.refresh.v1";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayEnvelope {
    pub envelope_id: String,
    pub event: GatewayEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayEvent {
    SlashCommand(CommandPayload),
    MessageCreated(MessageCreatedEvent),
    ComponentInteraction(ComponentInteractionEvent),
    Unsupported { event_type: String },
}

impl GatewayEvent {
    pub fn event_type(&self) -> GatewayEventType {
        match self {
            Self::SlashCommand(_) => GatewayEventType::SlashCommand,
            Self::MessageCreated(_) => GatewayEventType::MessageCreated,
            Self::ComponentInteraction(_) => GatewayEventType::ComponentInteraction,
            Self::Unsupported { .. } => GatewayEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GatewayEventType {
    SlashCommand,
    MessageCreated,
    ComponentInteraction,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageCreatedEvent {
    pub channel_id: String,
    pub message_id: String,
    pub author_is_self: bool,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentInteractionEvent {
    pub channel_id: String,
    pub message_id: String,
    pub user_id: String,
    pub custom_id: String,
    pub value: Option<String>,
    pub interaction_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HandlerResult {
    Replied(OutboundMessage),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Route(#[from] CommandRouteError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> GatewayEventType;
    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<GatewayEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(NoopBotCommandService));
    dispatcher.register(MessageCreatedHandler::new(Arc::new(NoopChannelApi)));
    dispatcher.register(ComponentInteractionHandler::new(NoopResultsRefreshService));
    dispatcher
}

pub struct SlashCommandHandler<S> {
    router: CommandRouter<S>,
}

impl<S> SlashCommandHandler<S>
where
    S: BotCommandService,
{
    pub fn new(service: S) -> Self {
        Self { router: CommandRouter::new(service) }
    }
}

#[async_trait]
impl<S> EventHandler for SlashCommandHandler<S>
where
    S: BotCommandService + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let reply = self.router.route(payload.clone()).await?;
        Ok(HandlerResult::Replied(reply))
    }
}

/// Reacts with a lemon to any mention of the trigger words. Everything else
/// in the firehose is ignored.
pub struct MessageCreatedHandler<C> {
    channel: Arc<C>,
}

impl<C> MessageCreatedHandler<C>
where
    C: ChannelApi,
{
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl<C> EventHandler for MessageCreatedHandler<C>
where
    C: ChannelApi + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::MessageCreated
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::MessageCreated(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if event.author_is_self {
            return Ok(HandlerResult::Ignored);
        }

        let content = event.content.to_lowercase();
        if !LEMON_TRIGGERS.iter().any(|trigger| content.contains(trigger)) {
            return Ok(HandlerResult::Ignored);
        }

        self.channel.add_reaction(&event.channel_id, &event.message_id, LEMON_EMOJI).await?;
        Ok(HandlerResult::Processed)
    }
}

/// Re-runs the results flow when the refresh button on a results message is
/// clicked.
#[async_trait]
pub trait ResultsRefreshService: Send + Sync {
    async fn refresh_results(
        &self,
        channel_id: &str,
        ranking_mode: RankingPolicy,
        ctx: &EventContext,
    ) -> Result<OutboundMessage, EventHandlerError>;
}

#[derive(Default)]
pub struct NoopResultsRefreshService;

#[async_trait]
impl ResultsRefreshService for NoopResultsRefreshService {
    async fn refresh_results(
        &self,
        _channel_id: &str,
        ranking_mode: RankingPolicy,
        _ctx: &EventContext,
    ) -> Result<OutboundMessage, EventHandlerError> {
        Ok(crate::messages::notice(format!(
            "Would refresh poll results under {}.",
            ranking_mode.label()
        )))
    }
}

pub struct ComponentInteractionHandler<S> {
    service: S,
}

impl<S> ComponentInteractionHandler<S>
where
    S: ResultsRefreshService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for ComponentInteractionHandler<S>
where
    S: ResultsRefreshService + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::ComponentInteraction
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::ComponentInteraction(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if event.custom_id != RESULTS_REFRESH_ACTION {
            return Ok(HandlerResult::Ignored);
        }

        let ranking_mode = event
            .value
            .as_deref()
            .and_then(|value| value.parse::<RankingPolicy>().ok())
            .unwrap_or_default();
        let reply = self.service.refresh_results(&event.channel_id, ranking_mode, ctx).await?;
        Ok(HandlerResult::Replied(reply))
    }
}
