//! Calendar session reminders: typed event model, attendee roster grouping,
//! and the reminder card. The calendar API itself sits behind
//! [`CalendarSource`]; events arrive already decoded.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scrape::card::{Card, CardFooter};

/// Attendee answer on a calendar invite. Anything the API reports that is
/// not a definite yes or no counts as unconfirmed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    #[default]
    NeedsAction,
}

impl ResponseStatus {
    pub fn from_api(value: &str) -> Self {
        match value {
            "accepted" => Self::Accepted,
            "declined" => Self::Declined,
            "tentative" => Self::Tentative,
            _ => Self::NeedsAction,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    pub response: ResponseStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<Attendee>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("calendar fetch failed: {0}")]
    Fetch(String),
    #[error("calendar response decode failed: {0}")]
    Decode(String),
}

/// Seam to the calendar API.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;
}

/// One channel that receives reminders, with its event filter and dressing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTarget {
    pub channel_id: String,
    /// Only events whose title starts with this prefix are announced here.
    pub title_prefix: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub mention_role: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
}

/// Footer suffix that marks a reminder message as machine-refreshed, so a
/// later run edits the existing message instead of posting a duplicate.
pub const REMINDER_FOOTER_MARKER: &str = "· session reminder";

pub fn find_event_with_prefix<'a>(
    events: &'a [CalendarEvent],
    title_prefix: &str,
) -> Option<&'a CalendarEvent> {
    events.iter().find(|event| event.summary.starts_with(title_prefix))
}

/// Attendee names bucketed by response, each bucket sorted and rendered as
/// quoted lines, or "-" when empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseRoster {
    pub accepted: String,
    pub declined: String,
    pub unconfirmed: String,
}

pub fn response_roster(
    attendees: &[Attendee],
    names: &HashMap<String, String>,
) -> ResponseRoster {
    let mut accepted = Vec::new();
    let mut declined = Vec::new();
    let mut unconfirmed = Vec::new();

    for attendee in attendees {
        let name = names.get(&attendee.email).cloned().unwrap_or_else(|| attendee.email.clone());
        match attendee.response {
            ResponseStatus::Accepted => accepted.push(name),
            ResponseStatus::Declined => declined.push(name),
            ResponseStatus::Tentative | ResponseStatus::NeedsAction => unconfirmed.push(name),
        }
    }

    ResponseRoster {
        accepted: roster_block(accepted),
        declined: roster_block(declined),
        unconfirmed: roster_block(unconfirmed),
    }
}

fn roster_block(mut names: Vec<String>) -> String {
    if names.is_empty() {
        return "-".to_owned();
    }
    names.sort();
    format!("> {}", names.join("\n> "))
}

fn discord_timestamp(at: DateTime<Utc>, style: char) -> String {
    format!("<t:{}:{style}>", at.timestamp())
}

/// Builds the reminder card for one event in one channel: event time as
/// platform timestamp tokens, attendee responses, optional art, and the
/// marker-suffixed footer.
pub fn reminder_card(
    event: &CalendarEvent,
    target: &ReminderTarget,
    names: &HashMap<String, String>,
) -> Card {
    let mut card = Card::new(&event.summary);
    card.description = Some(event.description.clone());
    card.image_url = target.image_url.clone();

    card.fields.push(crate::scrape::card::CardField {
        name: "Time".to_owned(),
        value: format!(
            "{} - {}\n🕓 {}",
            discord_timestamp(event.start, 'F'),
            discord_timestamp(event.end, 't'),
            discord_timestamp(event.start, 'R'),
        ),
        inline: false,
    });

    let roster = response_roster(&event.attendees, names);
    for (name, value) in [
        ("✅ Accepted", roster.accepted),
        ("❌ Declined", roster.declined),
        ("❔ Unconfirmed", roster.unconfirmed),
    ] {
        card.fields.push(crate::scrape::card::CardField {
            name: name.to_owned(),
            value,
            inline: true,
        });
    }

    let footer_text = match &target.footer {
        Some(text) => format!("{text} {REMINDER_FOOTER_MARKER}"),
        None => REMINDER_FOOTER_MARKER.to_owned(),
    };
    card.footer = Some(CardFooter { text: footer_text, icon_url: None });
    card
}

/// Whether a previously posted embed footer belongs to a reminder message.
pub fn is_reminder_footer(footer_text: &str) -> bool {
    footer_text.ends_with(REMINDER_FOOTER_MARKER)
}
