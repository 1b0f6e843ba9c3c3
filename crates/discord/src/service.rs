use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};

use freshcut_core::polls::{
    find_latest_poll, plan_medal_refresh, rank_options, results_summary, PollConfig,
    RankingPolicy, POLL_EMOJIS,
};
use freshcut_core::scrape::{self, PageFetcher};

use crate::channel::ChannelApi;
use crate::commands::{BotCommandService, CommandContext, CommandParseError, CommandRouteError};
use crate::events::{EventContext, EventHandlerError, ResultsRefreshService, RESULTS_REFRESH_ACTION};
use crate::messages::{notice, MessageButton, OutboundMessage};

const SCHEDULE_OPTION_FORMAT: &str = "%A %-m/%-d";
const SCHEDULE_DATE_FORMAT: &str = "%Y-%m-%d";

/// The live command service: composes the core lookup/poll/ranking flows
/// over the channel and page-fetch seams. One instance serves every
/// invocation; it holds only read-only configuration.
pub struct BotService<C, F> {
    channel: Arc<C>,
    fetcher: Arc<F>,
    wiki_base_url: String,
    poll_config: PollConfig,
}

impl<C, F> BotService<C, F>
where
    C: ChannelApi,
    F: PageFetcher,
{
    pub fn new(
        channel: Arc<C>,
        fetcher: Arc<F>,
        wiki_base_url: impl Into<String>,
        poll_config: PollConfig,
    ) -> Self {
        Self { channel, fetcher, wiki_base_url: wiki_base_url.into(), poll_config }
    }

    /// Sends the question, one message per option, and the help-text
    /// trailer, then seeds the vote reactions on each option message.
    async fn create_poll(
        &self,
        question: &str,
        options: Vec<String>,
        mention_role: Option<String>,
        channel_id: &str,
    ) -> Result<OutboundMessage, CommandRouteError> {
        if options.is_empty() {
            return Err(CommandParseError::InvalidOption {
                option: "options".to_owned(),
                reason: "at least one option is required".to_owned(),
            }
            .into());
        }

        let question_line = format!("{}{question}", self.poll_config.question_prefix);
        let content = match mention_role {
            Some(role) => format!("<@&{role}> {question_line}"),
            None => question_line,
        };

        self.send(channel_id, &OutboundMessage::text(content)).await?;
        let mut option_ids = Vec::with_capacity(options.len());
        for option in &options {
            let sent = self.send(channel_id, &OutboundMessage::text(option)).await?;
            option_ids.push(sent.id);
        }
        self.send(channel_id, &OutboundMessage::text(&self.poll_config.help_text)).await?;

        for emoji in POLL_EMOJIS {
            for message_id in &option_ids {
                self.channel
                    .add_reaction(channel_id, message_id, emoji)
                    .await
                    .map_err(|error| CommandRouteError::Service(error.to_string()))?;
            }
        }

        info!(option_count = options.len(), "created multipoll");
        Ok(notice(format!("Poll created with {} options.", options.len())))
    }

    /// Locates the latest poll, posts the ranked summary as a reply to the
    /// question message, and refreshes the medal reactions.
    async fn post_results(
        &self,
        channel_id: &str,
        policy: RankingPolicy,
    ) -> Result<OutboundMessage, CommandRouteError> {
        let history = self
            .channel
            .recent_messages(channel_id, self.poll_config.scan_limit)
            .await
            .map_err(|error| CommandRouteError::Service(error.to_string()))?;

        let snapshot = match find_latest_poll(&history, &self.poll_config) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                info!(error = %error, "results requested without a recent poll");
                return Ok(notice("Could not find recent multipoll."));
            }
        };

        let ranked = rank_options(&snapshot.options, policy);
        let summary = results_summary(&snapshot.question, &ranked, policy);
        let results_message = OutboundMessage::text(summary)
            .replying_to(&snapshot.question_message_id)
            .with_button(MessageButton {
                custom_id: RESULTS_REFRESH_ACTION.to_owned(),
                label: "Refresh".to_owned(),
                value: Some(policy.label().to_owned()),
            });
        self.send(channel_id, &results_message).await?;

        // Clear stale medals before re-awarding; a reaction changing in
        // between is an accepted race.
        let refresh = plan_medal_refresh(&ranked);
        for award in &refresh.clear {
            self.channel
                .remove_own_reaction(channel_id, &award.message_id, &award.emoji)
                .await
                .map_err(|error| CommandRouteError::Service(error.to_string()))?;
        }
        for award in &refresh.add {
            self.channel
                .add_reaction(channel_id, &award.message_id, &award.emoji)
                .await
                .map_err(|error| CommandRouteError::Service(error.to_string()))?;
        }

        Ok(notice("Fetching multipoll results..."))
    }

    async fn send(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<crate::channel::SentMessage, CommandRouteError> {
        self.channel
            .send_message(channel_id, message)
            .await
            .map_err(|error| CommandRouteError::Service(error.to_string()))
    }
}

#[async_trait]
impl<C, F> BotCommandService for BotService<C, F>
where
    C: ChannelApi + 'static,
    F: PageFetcher + 'static,
{
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
        mention_role: Option<String>,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        let options = split_poll_options(&options)?;
        self.create_poll(&question, options, mention_role, &ctx.channel_id).await
    }

    async fn schedule(
        &self,
        question: String,
        start_date: Option<String>,
        end_date: Option<String>,
        mention_role: Option<String>,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        let today = Utc::now().date_naive();
        let (start, end) =
            resolve_schedule_range(today, start_date.as_deref(), end_date.as_deref())?;
        let options = schedule_day_options(start, end);
        self.create_poll(&question, options, mention_role, &ctx.channel_id).await
    }

    async fn multipoll_results(
        &self,
        ranking_mode: RankingPolicy,
        ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        self.post_results(&ctx.channel_id, ranking_mode).await
    }

    async fn spell_lookup(
        &self,
        spell_name: String,
        _ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        match scrape::fetch_spell_card(self.fetcher.as_ref(), &self.wiki_base_url, &spell_name)
            .await
        {
            Ok(card) => Ok(OutboundMessage::card(card)),
            Err(error) => {
                warn!(%spell_name, error = %error, "spell lookup failed");
                Ok(notice(format!(
                    "Error: Could not find a DnD 5e spell named **{spell_name}**."
                )))
            }
        }
    }

    async fn item_lookup(
        &self,
        item_name: String,
        _ctx: &CommandContext,
    ) -> Result<OutboundMessage, CommandRouteError> {
        match scrape::fetch_item_card(self.fetcher.as_ref(), &self.wiki_base_url, &item_name).await
        {
            Ok(card) => Ok(OutboundMessage::card(card)),
            Err(error) => {
                warn!(%item_name, error = %error, "item lookup failed");
                Ok(notice(format!(
                    "Error: Could not find **{item_name}** in category **{}**.",
                    scrape::ITEM_CATEGORY
                )))
            }
        }
    }
}

#[async_trait]
impl<C, F> ResultsRefreshService for BotService<C, F>
where
    C: ChannelApi + 'static,
    F: PageFetcher + 'static,
{
    async fn refresh_results(
        &self,
        channel_id: &str,
        ranking_mode: RankingPolicy,
        _ctx: &EventContext,
    ) -> Result<OutboundMessage, EventHandlerError> {
        self.post_results(channel_id, ranking_mode).await.map_err(EventHandlerError::from)
    }
}

/// Shlex-style option splitting so quoted phrases stay one option.
fn split_poll_options(options: &str) -> Result<Vec<String>, CommandRouteError> {
    shell_words::split(options).map_err(|error| {
        CommandParseError::InvalidOption {
            option: "options".to_owned(),
            reason: error.to_string(),
        }
        .into()
    })
}

/// Scheduling range: start defaults to tomorrow, end to six days after
/// start, giving a week of day options.
fn resolve_schedule_range(
    today: NaiveDate,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), CommandRouteError> {
    let start = match start_date {
        Some(raw) => parse_schedule_date("start_date", raw)?,
        None => today + Duration::days(1),
    };
    let end = match end_date {
        Some(raw) => parse_schedule_date("end_date", raw)?,
        None => start + Duration::days(6),
    };
    if end < start {
        return Err(CommandParseError::InvalidOption {
            option: "end_date".to_owned(),
            reason: format!("end date {end} precedes start date {start}"),
        }
        .into());
    }
    Ok((start, end))
}

fn parse_schedule_date(option: &str, raw: &str) -> Result<NaiveDate, CommandRouteError> {
    NaiveDate::parse_from_str(raw.trim(), SCHEDULE_DATE_FORMAT).map_err(|_| {
        CommandParseError::InvalidOption {
            option: option.to_owned(),
            reason: format!("expected YYYY-MM-DD, got `{raw}`"),
        }
        .into()
    })
}

/// One poll option per day of the inclusive range, e.g. "Friday 8/14".
fn schedule_day_options(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    let mut options = Vec::new();
    let mut day = start;
    while day <= end {
        options.push(day.format(SCHEDULE_OPTION_FORMAT).to_string());
        day += Duration::days(1);
    }
    options
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use freshcut_core::history::{ChannelMessage, ReactionTally};
    use freshcut_core::polls::{PollConfig, RankingPolicy, MAYBE, NO, UNLIKELY, YES};
    use freshcut_core::scrape::{FetchError, PageFetcher};

    use crate::channel::{ChannelApi, ChannelError, SentMessage};
    use crate::commands::{BotCommandService, CommandContext};
    use crate::messages::OutboundMessage;

    use super::{resolve_schedule_range, schedule_day_options, BotService};

    #[derive(Default)]
    struct ScriptedChannel {
        history: Vec<ChannelMessage>,
        state: Mutex<ChannelLog>,
    }

    #[derive(Default)]
    struct ChannelLog {
        sent: Vec<(String, OutboundMessage)>,
        reactions_added: Vec<(String, String)>,
        reactions_removed: Vec<(String, String)>,
        next_id: usize,
    }

    impl ScriptedChannel {
        fn with_history(history: Vec<ChannelMessage>) -> Self {
            Self { history, state: Mutex::default() }
        }
    }

    #[async_trait]
    impl ChannelApi for ScriptedChannel {
        async fn send_message(
            &self,
            channel_id: &str,
            message: &OutboundMessage,
        ) -> Result<SentMessage, ChannelError> {
            let mut state = self.state.lock().expect("lock");
            state.next_id += 1;
            let id = format!("sent-{}", state.next_id);
            state.sent.push((channel_id.to_owned(), message.clone()));
            Ok(SentMessage { id })
        }

        async fn edit_message(
            &self,
            _channel_id: &str,
            _message_id: &str,
            _message: &OutboundMessage,
        ) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn recent_messages(
            &self,
            _channel_id: &str,
            limit: usize,
        ) -> Result<Vec<ChannelMessage>, ChannelError> {
            Ok(self.history.iter().take(limit).cloned().collect())
        }

        async fn add_reaction(
            &self,
            _channel_id: &str,
            message_id: &str,
            emoji: &str,
        ) -> Result<(), ChannelError> {
            self.state
                .lock()
                .expect("lock")
                .reactions_added
                .push((message_id.to_owned(), emoji.to_owned()));
            Ok(())
        }

        async fn remove_own_reaction(
            &self,
            _channel_id: &str,
            message_id: &str,
            emoji: &str,
        ) -> Result<(), ChannelError> {
            self.state
                .lock()
                .expect("lock")
                .reactions_removed
                .push((message_id.to_owned(), emoji.to_owned()));
            Ok(())
        }
    }

    struct FixedPage(&'static str);

    #[async_trait]
    impl PageFetcher for FixedPage {
        async fn fetch_page(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    struct MissingPage;

    #[async_trait]
    impl PageFetcher for MissingPage {
        async fn fetch_page(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Unreachable { url: url.to_owned(), reason: "404".to_owned() })
        }
    }

    fn ctx() -> CommandContext {
        CommandContext {
            channel_id: "C1".to_owned(),
            guild_id: Some("G1".to_owned()),
            user_id: "U1".to_owned(),
            request_id: "req-1".to_owned(),
        }
    }

    fn service(
        channel: Arc<ScriptedChannel>,
    ) -> BotService<ScriptedChannel, MissingPage> {
        BotService::new(
            channel,
            Arc::new(MissingPage),
            "http://wiki.test",
            PollConfig::default(),
        )
    }

    #[tokio::test]
    async fn multipoll_sends_question_options_help_in_order_and_seeds_reactions() {
        let channel = Arc::new(ScriptedChannel::default());
        let service = service(channel.clone());

        let reply = service
            .multipoll(
                "Where next?".to_owned(),
                "A B \"The letter C\"".to_owned(),
                None,
                &ctx(),
            )
            .await
            .expect("multipoll");
        assert!(reply.content.expect("content").contains("3 options"));

        let state = channel.state.lock().expect("lock");
        let contents: Vec<&str> = state
            .sent
            .iter()
            .map(|(_, message)| message.content.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(contents[0], "New poll: Where next?");
        assert_eq!(&contents[1..4], &["A", "B", "The letter C"]);
        assert!(contents[4].starts_with("Click one reaction"));

        // Four emojis seeded per option, emoji-major order.
        assert_eq!(state.reactions_added.len(), 12);
        assert_eq!(state.reactions_added[0], ("sent-2".to_owned(), YES.to_owned()));
        assert_eq!(state.reactions_added[3], ("sent-2".to_owned(), MAYBE.to_owned()));
    }

    #[tokio::test]
    async fn multipoll_mention_role_lands_on_the_question_message() {
        let channel = Arc::new(ScriptedChannel::default());
        let service = service(channel.clone());

        service
            .multipoll("Where?".to_owned(), "A".to_owned(), Some("R9".to_owned()), &ctx())
            .await
            .expect("multipoll");

        let state = channel.state.lock().expect("lock");
        assert_eq!(
            state.sent[0].1.content.as_deref(),
            Some("<@&R9> New poll: Where?")
        );
    }

    #[tokio::test]
    async fn unbalanced_quotes_in_options_are_a_parse_error() {
        let channel = Arc::new(ScriptedChannel::default());
        let service = service(channel.clone());

        let result = service
            .multipoll("Where?".to_owned(), "A \"unclosed".to_owned(), None, &ctx())
            .await;
        assert!(result.is_err());
        assert!(channel.state.lock().expect("lock").sent.is_empty());
    }

    fn seeded(emoji: &str, count: u32) -> ReactionTally {
        ReactionTally { emoji: emoji.to_owned(), count, mine: true }
    }

    fn poll_history(config: &PollConfig) -> Vec<ChannelMessage> {
        let option = |id: &str, text: &str, yes: u32| ChannelMessage {
            id: id.to_owned(),
            author_is_self: true,
            content: text.to_owned(),
            embed_footer: None,
            reactions: vec![
                seeded(YES, yes),
                seeded(MAYBE, 1),
                seeded(UNLIKELY, 1),
                seeded(NO, 1),
            ],
        };
        vec![
            ChannelMessage {
                id: "m-help".to_owned(),
                author_is_self: true,
                content: config.help_text.clone(),
                embed_footer: None,
                reactions: vec![],
            },
            option("m-sat", "Saturday", 2),
            option("m-fri", "Friday", 4),
            ChannelMessage {
                id: "m-q".to_owned(),
                author_is_self: true,
                content: "New poll: When do we play?".to_owned(),
                embed_footer: None,
                reactions: vec![],
            },
        ]
    }

    #[tokio::test]
    async fn results_posts_ranked_summary_replying_to_the_question() {
        let config = PollConfig::default();
        let channel = Arc::new(ScriptedChannel::with_history(poll_history(&config)));
        let service = service(channel.clone());

        service
            .multipoll_results(RankingPolicy::Score, &ctx())
            .await
            .expect("results");

        let state = channel.state.lock().expect("lock");
        assert_eq!(state.sent.len(), 1);
        let (_, results) = &state.sent[0];
        let summary = results.content.as_deref().expect("summary");
        assert!(summary.starts_with("Results for: **When do we play?**"));
        assert!(summary.contains("1. Friday [Score: 9]"), "summary was: {summary}");
        assert!(summary.contains("2. Saturday [Score: 3]"), "summary was: {summary}");
        assert_eq!(results.reference_message_id.as_deref(), Some("m-q"));
        assert_eq!(results.buttons.len(), 1);
    }

    #[tokio::test]
    async fn results_awards_medals_to_option_messages() {
        let config = PollConfig::default();
        let channel = Arc::new(ScriptedChannel::with_history(poll_history(&config)));
        let service = service(channel.clone());

        service
            .multipoll_results(RankingPolicy::Score, &ctx())
            .await
            .expect("results");

        let state = channel.state.lock().expect("lock");
        assert_eq!(
            state.reactions_added,
            vec![("m-fri".to_owned(), "🥇".to_owned()), ("m-sat".to_owned(), "🥈".to_owned())]
        );
        assert!(state.reactions_removed.is_empty());
    }

    #[tokio::test]
    async fn stale_medals_are_cleared_before_the_new_awards() {
        let config = PollConfig::default();
        let mut history = poll_history(&config);
        history[1].reactions.push(ReactionTally {
            emoji: "🥇".to_owned(),
            count: 1,
            mine: true,
        });
        let channel = Arc::new(ScriptedChannel::with_history(history));
        let service = service(channel.clone());

        service
            .multipoll_results(RankingPolicy::Score, &ctx())
            .await
            .expect("results");

        let state = channel.state.lock().expect("lock");
        assert_eq!(state.reactions_removed, vec![("m-sat".to_owned(), "🥇".to_owned())]);
        assert_eq!(state.reactions_added[0], ("m-fri".to_owned(), "🥇".to_owned()));
    }

    #[tokio::test]
    async fn results_without_a_recent_poll_degrade_to_a_notice() {
        let channel = Arc::new(ScriptedChannel::default());
        let service = service(channel.clone());

        let reply = service
            .multipoll_results(RankingPolicy::Score, &ctx())
            .await
            .expect("results");
        assert_eq!(reply.content.as_deref(), Some("Could not find recent multipoll."));
        assert!(channel.state.lock().expect("lock").sent.is_empty());
    }

    const SPELL_PAGE: &str = r#"<div class="page-title page-header">Fireball</div>
<div id="page-content">
<p>Source: PHB</p>
<p>3rd-level evocation</p>
<p><strong>Casting Time:</strong> 1 action</p>
<p><strong>Range:</strong> 150 feet</p>
<p><strong>Components:</strong> V, S, M</p>
<p><strong>Duration:</strong> Instantaneous</p>
<p>A bright streak flashes from your pointing finger.</p>
<p><strong><em>Spell Lists.</em></strong> Sorcerer, Wizard</p>
</div>"#;

    #[tokio::test]
    async fn spell_lookup_replies_with_a_card() {
        let service = BotService::new(
            Arc::new(ScriptedChannel::default()),
            Arc::new(FixedPage(SPELL_PAGE)),
            "http://wiki.test",
            PollConfig::default(),
        );

        let reply = service.spell_lookup("Fireball".to_owned(), &ctx()).await.expect("lookup");
        let embed = reply.embed.expect("embed");
        assert_eq!(embed.title.as_deref(), Some("Fireball"));
        assert_eq!(embed.description.as_deref(), Some("3rd-level evocation"));
    }

    #[tokio::test]
    async fn failed_spell_lookup_becomes_a_specific_user_notice() {
        let channel = Arc::new(ScriptedChannel::default());
        let service = service(channel);

        let reply =
            service.spell_lookup("Fireball Typo".to_owned(), &ctx()).await.expect("lookup");
        assert_eq!(
            reply.content.as_deref(),
            Some("Error: Could not find a DnD 5e spell named **Fireball Typo**.")
        );
        assert!(reply.ephemeral);
    }

    #[tokio::test]
    async fn failed_item_lookup_names_the_category() {
        let channel = Arc::new(ScriptedChannel::default());
        let service = service(channel);

        let reply = service.item_lookup("Odd Trinket".to_owned(), &ctx()).await.expect("lookup");
        assert_eq!(
            reply.content.as_deref(),
            Some("Error: Could not find **Odd Trinket** in category **Wondrous Items**.")
        );
    }

    #[test]
    fn schedule_range_defaults_to_a_week_starting_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).expect("date");
        let (start, end) = resolve_schedule_range(today, None, None).expect("range");
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 8).expect("date"));
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 14).expect("date"));
        assert_eq!(schedule_day_options(start, end).len(), 7);
    }

    #[test]
    fn schedule_options_render_weekday_and_short_date() {
        let start = NaiveDate::from_ymd_opt(2026, 8, 14).expect("date");
        let options = schedule_day_options(start, start + chrono::Duration::days(1));
        assert_eq!(options, ["Friday 8/14", "Saturday 8/15"]);
    }

    #[test]
    fn schedule_range_rejects_inverted_and_garbled_dates() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).expect("date");
        assert!(resolve_schedule_range(today, Some("2026-08-20"), Some("2026-08-10")).is_err());
        assert!(resolve_schedule_range(today, Some("next tuesday"), None).is_err());
    }
}
