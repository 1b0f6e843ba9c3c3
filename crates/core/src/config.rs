use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::ReminderTarget;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub wiki: WikiConfig,
    pub calendar: CalendarConfig,
    pub polls: PollsConfig,
    pub reminders: Vec<ReminderTarget>,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct WikiConfig {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct CalendarConfig {
    pub api_token: Option<SecretString>,
    pub calendar_id: String,
    /// UTC hour of the daily reminder tick.
    pub reminder_hour_utc: u8,
    /// Email → display name directory for attendee rosters.
    pub attendee_names: HashMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct PollsConfig {
    pub scan_limit: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub discord_bot_token: Option<String>,
    pub wiki_base_url: Option<String>,
    pub calendar_api_token: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig { bot_token: String::new().into() },
            wiki: WikiConfig { base_url: crate::scrape::DEFAULT_WIKI_BASE_URL.to_string() },
            calendar: CalendarConfig {
                api_token: None,
                calendar_id: "primary".to_string(),
                reminder_hour_utc: 12,
                attendee_names: HashMap::new(),
            },
            polls: PollsConfig { scan_limit: 200 },
            reminders: Vec::new(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("freshcut.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(discord) = patch.discord {
            if let Some(bot_token_value) = discord.bot_token {
                self.discord.bot_token = secret_value(bot_token_value);
            }
        }

        if let Some(wiki) = patch.wiki {
            if let Some(base_url) = wiki.base_url {
                self.wiki.base_url = base_url;
            }
        }

        if let Some(calendar) = patch.calendar {
            if let Some(api_token_value) = calendar.api_token {
                self.calendar.api_token = Some(secret_value(api_token_value));
            }
            if let Some(calendar_id) = calendar.calendar_id {
                self.calendar.calendar_id = calendar_id;
            }
            if let Some(reminder_hour_utc) = calendar.reminder_hour_utc {
                self.calendar.reminder_hour_utc = reminder_hour_utc;
            }
            if let Some(attendee_names) = calendar.attendee_names {
                self.calendar.attendee_names = attendee_names;
            }
        }

        if let Some(polls) = patch.polls {
            if let Some(scan_limit) = polls.scan_limit {
                self.polls.scan_limit = scan_limit;
            }
        }

        if let Some(reminders) = patch.reminders {
            self.reminders = reminders;
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FRESHCUT_DISCORD_BOT_TOKEN") {
            self.discord.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("FRESHCUT_WIKI_BASE_URL") {
            self.wiki.base_url = value;
        }
        if let Some(value) = read_env("FRESHCUT_CALENDAR_API_TOKEN") {
            self.calendar.api_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("FRESHCUT_CALENDAR_ID") {
            self.calendar.calendar_id = value;
        }
        if let Some(value) = read_env("FRESHCUT_CALENDAR_REMINDER_HOUR_UTC") {
            self.calendar.reminder_hour_utc =
                parse_u8("FRESHCUT_CALENDAR_REMINDER_HOUR_UTC", &value)?;
        }
        if let Some(value) = read_env("FRESHCUT_POLLS_SCAN_LIMIT") {
            self.polls.scan_limit = parse_usize("FRESHCUT_POLLS_SCAN_LIMIT", &value)?;
        }

        let log_level = read_env("FRESHCUT_LOGGING_LEVEL").or_else(|| read_env("FRESHCUT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FRESHCUT_LOGGING_FORMAT").or_else(|| read_env("FRESHCUT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(discord_bot_token) = overrides.discord_bot_token {
            self.discord.bot_token = secret_value(discord_bot_token);
        }
        if let Some(wiki_base_url) = overrides.wiki_base_url {
            self.wiki.base_url = wiki_base_url;
        }
        if let Some(calendar_api_token) = overrides.calendar_api_token {
            self.calendar.api_token = Some(secret_value(calendar_api_token));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.wiki.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("wiki.base_url must not be empty".to_owned()));
        }
        if self.calendar.reminder_hour_utc >= 24 {
            return Err(ConfigError::Validation(format!(
                "calendar.reminder_hour_utc must be 0-23, got {}",
                self.calendar.reminder_hour_utc
            )));
        }
        if self.polls.scan_limit == 0 {
            return Err(ConfigError::Validation("polls.scan_limit must be at least 1".to_owned()));
        }
        for (index, target) in self.reminders.iter().enumerate() {
            if target.channel_id.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "reminders[{index}].channel_id must not be empty"
                )));
            }
            if target.title_prefix.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "reminders[{index}].title_prefix must not be empty"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discord: Option<DiscordPatch>,
    wiki: Option<WikiPatch>,
    calendar: Option<CalendarPatch>,
    polls: Option<PollsPatch>,
    reminders: Option<Vec<ReminderTarget>>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    bot_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WikiPatch {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarPatch {
    api_token: Option<String>,
    calendar_id: Option<String>,
    reminder_hour_utc: Option<u8>,
    attendee_names: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct PollsPatch {
    scan_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("freshcut.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}
