use async_trait::async_trait;
use thiserror::Error;

use freshcut_core::polls::RankingPolicy;

use crate::messages::{notice, OutboundMessage};

/// One slash-command invocation as delivered by the gateway: the command
/// name plus its named option values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandPayload {
    pub name: String,
    pub options: Vec<CommandOptionValue>,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub user_id: String,
    pub interaction_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOptionValue {
    pub name: String,
    pub value: String,
}

impl CommandPayload {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| option.value.as_str())
    }

    fn required_option(&self, name: &str) -> Result<String, CommandParseError> {
        self.option(name).map(str::to_owned).ok_or_else(|| CommandParseError::MissingOption {
            command: self.name.clone(),
            option: name.to_owned(),
        })
    }

    fn optional_option(&self, name: &str) -> Option<String> {
        self.option(name).map(str::to_owned)
    }
}

/// Invocation context handed to the command service alongside the parsed
/// command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandContext {
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub user_id: String,
    pub request_id: String,
}

impl CommandContext {
    fn from_payload(payload: &CommandPayload) -> Self {
        Self {
            channel_id: payload.channel_id.clone(),
            guild_id: payload.guild_id.clone(),
            user_id: payload.user_id.clone(),
            request_id: payload.interaction_id.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Hello { member: Option<String> },
    Multipoll { question: String, options: String, mention_role: Option<String> },
    Schedule {
        question: String,
        start_date: Option<String>,
        end_date: Option<String>,
        mention_role: Option<String>,
    },
    MultipollResults { ranking_mode: RankingPolicy },
    SpellLookup { spell_name: String },
    ItemLookup { item_name: String },
    Unknown { name: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("missing required option `{option}` for `/{command}`")]
    MissingOption { command: String, option: String },
    #[error("invalid value for option `{option}`: {reason}")]
    InvalidOption { option: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error("command service failed: {0}")]
    Service(String),
}

pub fn classify_command(payload: &CommandPayload) -> Result<BotCommand, CommandParseError> {
    match payload.name.as_str() {
        "hello" => Ok(BotCommand::Hello { member: payload.optional_option("member") }),
        "multipoll" => Ok(BotCommand::Multipoll {
            question: payload.required_option("question")?,
            options: payload.required_option("options")?,
            mention_role: payload.optional_option("mention_role"),
        }),
        "schedule" => Ok(BotCommand::Schedule {
            question: payload.required_option("question")?,
            start_date: payload.optional_option("start_date"),
            end_date: payload.optional_option("end_date"),
            mention_role: payload.optional_option("mention_role"),
        }),
        "multipoll_results" => {
            let ranking_mode = match payload.option("ranking_mode") {
                Some(raw) => raw.parse::<RankingPolicy>().map_err(|error| {
                    CommandParseError::InvalidOption {
                        option: "ranking_mode".to_owned(),
                        reason: error.to_string(),
                    }
                })?,
                None => RankingPolicy::default(),
            };
            Ok(BotCommand::MultipollResults { ranking_mode })
        }
        "spell_lookup" => {
            Ok(BotCommand::SpellLookup { spell_name: payload.required_option("spell_name")? })
        }
        "item_lookup" => {
            Ok(BotCommand::ItemLookup { item_name: payload.required_option("item_name")? })
        }
        other => Ok(BotCommand::Unknown { name: other.to_owned() }),
    }
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: BotCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn route(
        &self,
        payload: CommandPayload,
    ) -> Result<OutboundMessage, CommandRouteError> {
        let ctx = CommandContext::from_payload(&payload);
        match classify_command(&payload)? {
            BotCommand::Hello { member } => self.service.hello(member, &ctx).await,
            BotCommand::Multipoll { question, options, mention_role } => {
                self.service.multipoll(question, options, mention_role, &ctx).await
            }
            BotCommand::Schedule { question, start_date, end_date, mention_role } => {
                self.service.schedule(question, start_date, end_date, mention_role, &ctx).await
            }
            BotCommand::MultipollResults { ranking_mode } => {
                self.service.multipoll_results(ranking_mode, &ctx).await
            }
            BotCommand::SpellLookup { spell_name } => {
                self.service.spell_lookup(spell_name, &ctx).await
            }
            BotCommand::ItemLookup { item_name } => {
                self.service.item_lookup(item_name, &ctx).await
            }
            BotCommand::Unknown { name } => {
                Ok(notice(format!("Unsupported command `/{name}`.")))
            }
        }
    }
}

/// Everything a command invocation can do, behind one seam so the gateway
/// wiring and the tests can swap implementations.
#[async_trait]
pub trait BotCommandService: Send + Sync {
    async fn hello(
        &self,
        member: Option<String>,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError>;

    async fn multipoll(
        &self,
        question: String,
        options: String,
        mention_role: Option<String>,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError>;

    async fn schedule(
        &self,
        question: String,
        start_date: Option<String>,
        end_date: Option<String>,
        mention_role: Option<String>,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError>;

    async fn multipoll_results(
        &self,
        ranking_mode: RankingPolicy,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError>;

    async fn spell_lookup(
        &self,
        spell_name: String,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError>;

    async fn item_lookup(
        &self,
        item_name: String,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError>;
}

/// Canned responses for scaffolding and dispatcher tests.
#[derive(Default)]
pub struct NoopBotCommandService;

#[async_trait]
impl BotCommandService for NoopBotCommandService {
    async fn hello(
        &self,
        member: Option<String>,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        let user_id = member.unwrap_or_else(|| ctx.user_id.clone());
        Ok(OutboundMessage::text(format!("Smiley day to you, <@{user_id}>!")))
    }

    async fn multipoll(
        &self,
        question: String,
        options: String,
        _mention_role: Option<String>,
        _ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        Ok(notice(format!("Would create poll `{question}` with options `{options}`.")))
    }

    async fn schedule(
        &self,
        question: String,
        _start_date: Option<String>,
        _end_date: Option<String>,
        _mention_role: Option<String>,
        _ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        Ok(notice(format!("Would create scheduling poll `{question}`.")))
    }

    async fn multipoll_results(
        &self,
        ranking_mode: RankingPolicy,
        _ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        Ok(notice(format!("Would rank the latest poll under {}.", ranking_mode.label())))
    }

    async fn spell_lookup(
        &self,
        spell_name: String,
        _ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        Ok(notice(format!("Would look up spell `{spell_name}`.")))
    }

    async fn item_lookup(
        &self,
        item_name: String,
        _ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        Ok(notice(format!("Would look up item `{item_name}`.")))
    }
}
