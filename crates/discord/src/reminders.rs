use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use freshcut_core::calendar::{
    find_event_with_prefix, is_reminder_footer, reminder_card, CalendarSource, ReminderTarget,
};

use crate::channel::ChannelApi;
use crate::messages::OutboundMessage;

/// How far ahead the daily tick looks for events to announce.
const LOOKAHEAD_HOURS: i64 = 24;

/// How much history is scanned for a prior reminder to edit in place.
const REMINDER_HISTORY_LIMIT: usize = 50;

/// Daily session reminders: fetch upcoming calendar events, match each
/// configured channel's title prefix, and post (or refresh) a reminder card.
pub struct ReminderService<C, S> {
    channel: Arc<C>,
    calendar: Arc<S>,
    targets: Vec<ReminderTarget>,
    attendee_names: HashMap<String, String>,
}

impl<C, S> ReminderService<C, S>
where
    C: ChannelApi,
    S: CalendarSource,
{
    pub fn new(
        channel: Arc<C>,
        calendar: Arc<S>,
        targets: Vec<ReminderTarget>,
        attendee_names: HashMap<String, String>,
    ) -> Self {
        Self { channel, calendar, targets, attendee_names }
    }

    /// One scheduled tick. Calendar or channel trouble is logged and scoped
    /// to the affected target; the tick itself never fails.
    pub async fn run_tick(&self, now: DateTime<Utc>) {
        let events = match self
            .calendar
            .events_between(now, now + Duration::hours(LOOKAHEAD_HOURS))
            .await
        {
            Ok(events) => events,
            Err(error) => {
                warn!(error = %error, "calendar fetch failed; skipping reminder tick");
                return;
            }
        };

        for target in &self.targets {
            let Some(event) = find_event_with_prefix(&events, &target.title_prefix) else {
                continue;
            };

            let card = reminder_card(event, target, &self.attendee_names);
            let mut message = OutboundMessage::card(card);
            if let Some(role) = &target.mention_role {
                message.content = Some(format!("<@&{role}>"));
            }

            if let Err(error) = self.post_or_refresh(&target.channel_id, &message).await {
                warn!(
                    channel_id = %target.channel_id,
                    error = %error,
                    "failed to deliver reminder; continuing with next target"
                );
            }
        }
    }

    /// Edits the previous reminder in place when one is still in recent
    /// history (recognized by the footer marker); otherwise sends fresh.
    async fn post_or_refresh(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), crate::channel::ChannelError> {
        let history = self.channel.recent_messages(channel_id, REMINDER_HISTORY_LIMIT).await?;
        let prior = history.iter().find(|candidate| {
            candidate.author_is_self
                && candidate.embed_footer.as_deref().is_some_and(is_reminder_footer)
        });

        match prior {
            Some(existing) => {
                info!(channel_id, message_id = %existing.id, "refreshing existing reminder");
                self.channel.edit_message(channel_id, &existing.id, message).await
            }
            None => {
                info!(channel_id, "posting new reminder");
                self.channel.send_message(channel_id, message).await.map(|_| ())
            }
        }
    }
}
