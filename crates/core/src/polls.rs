//! Reaction-based voting: locating the most recent multipoll in channel
//! history, tallying emoji votes under a ranking policy, and planning the
//! medal-reaction refresh for the winners.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::history::ChannelMessage;

pub const YES: &str = "🍏";
pub const MAYBE: &str = "🤨";
pub const UNLIKELY: &str = "🥶";
pub const NO: &str = "🚫";

/// Vote emojis in weight-table order. Every option message is seeded with
/// all four so voters only have to click.
pub const POLL_EMOJIS: [&str; 4] = [YES, MAYBE, UNLIKELY, NO];

/// Medals for the top three distinct rank groups of a results listing.
pub const MEDAL_EMOJIS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Poll constants shared by the poll creator and the results scanner. The
/// scanner recognizes a poll by the exact help text and the question prefix,
/// so both sides must use the same instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
    pub question_prefix: String,
    pub help_text: String,
    /// How many history messages the scanner is willing to walk before
    /// concluding no poll exists.
    pub scan_limit: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            question_prefix: "New poll: ".to_owned(),
            help_text: format!(
                "Click one reaction on each poll option. \
                 {YES} = Yes, {MAYBE} = Maybe, {UNLIKELY} = Likely Not, {NO} = No"
            ),
            scan_limit: 200,
        }
    }
}

/// Weight table applied to the four vote emojis when scoring an option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPolicy {
    /// Balanced: yes and no pull symmetrically.
    #[default]
    Score,
    /// Favor enthusiasm; a no barely registers.
    MostGood,
    /// Favor consensus; a no is nearly a veto.
    LeastBad,
}

impl RankingPolicy {
    pub fn weights(self) -> [f64; 4] {
        match self {
            Self::Score => [3.0, 1.0, -1.0, -3.0],
            Self::MostGood => [100.0, 10.0, 1.0, -0.1],
            Self::LeastBad => [0.1, -1.0, -10.0, -100.0],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Score => "SCORE",
            Self::MostGood => "MOST_GOOD",
            Self::LeastBad => "LEAST_BAD",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported ranking mode `{0}` (expected SCORE|MOST_GOOD|LEAST_BAD)")]
pub struct RankingPolicyParseError(String);

impl std::str::FromStr for RankingPolicy {
    type Err = RankingPolicyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SCORE" => Ok(Self::Score),
            "MOST_GOOD" => Ok(Self::MostGood),
            "LEAST_BAD" => Ok(Self::LeastBad),
            other => Err(RankingPolicyParseError(other.to_owned())),
        }
    }
}

/// One option message with its discounted vote counts, indexed like
/// `POLL_EMOJIS`. The bot seeds one reaction per emoji, so each raw count
/// is reduced by one before any weighting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollOption {
    pub message_id: String,
    pub text: String,
    pub counts: [u32; 4],
    /// Medal reactions this bot already placed on the message, cleared on
    /// the next refresh.
    pub own_medals: Vec<String>,
}

impl PollOption {
    fn from_message(message: &ChannelMessage) -> Self {
        let mut counts = [0u32; 4];
        for (slot, emoji) in POLL_EMOJIS.iter().enumerate() {
            counts[slot] = message.reaction_count(emoji).saturating_sub(1);
        }
        let own_medals = MEDAL_EMOJIS
            .iter()
            .filter(|medal| message.has_own_reaction(medal))
            .map(|medal| (*medal).to_owned())
            .collect();

        Self { message_id: message.id.clone(), text: message.content.clone(), counts, own_medals }
    }

    fn is_seeded(message: &ChannelMessage) -> bool {
        POLL_EMOJIS.iter().any(|emoji| message.has_own_reaction(emoji))
    }

    pub fn score(&self, policy: RankingPolicy) -> f64 {
        let weights = policy.weights();
        self.counts
            .iter()
            .zip(weights)
            .map(|(&count, weight)| f64::from(count) * weight)
            .sum()
    }

    /// `name [Score: s] <one emoji per counted vote>` summary line.
    fn summary_line(&self, policy: RankingPolicy) -> String {
        let mut line = format!("{} [Score: {}] ", self.text, format_score(self.score(policy)));
        for (slot, emoji) in POLL_EMOJIS.iter().enumerate() {
            line.push_str(&emoji.repeat(self.counts[slot] as usize));
        }
        line
    }
}

/// The most recent poll as reconstructed from history. Never persisted;
/// every results request rebuilds it from scratch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSnapshot {
    pub question_message_id: String,
    /// Question text with the poll prefix stripped.
    pub question: String,
    /// Options in posting order.
    pub options: Vec<PollOption>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PollScanError {
    #[error("no recent multipoll found")]
    NoPollFound,
}

/// Walks recent messages newest-first looking for the trailing help-text
/// marker, then collects seeded option messages until the question message
/// closes the poll. Only this bot's messages participate; the scan gives up
/// after the configured ceiling.
pub fn find_latest_poll(
    messages: &[ChannelMessage],
    config: &PollConfig,
) -> Result<PollSnapshot, PollScanError> {
    enum ScanState {
        SeekingMarker,
        CollectingOptions,
    }

    let mut state = ScanState::SeekingMarker;
    let mut options: Vec<PollOption> = Vec::new();

    for message in messages.iter().take(config.scan_limit) {
        if !message.author_is_self {
            continue;
        }
        match state {
            ScanState::SeekingMarker => {
                if message.content == config.help_text {
                    state = ScanState::CollectingOptions;
                }
            }
            ScanState::CollectingOptions => {
                if let Some(question) = message.content.strip_prefix(&config.question_prefix) {
                    // Collected newest-first; restore posting order.
                    options.reverse();
                    debug!(option_count = options.len(), "found multipoll question");
                    return Ok(PollSnapshot {
                        question_message_id: message.id.clone(),
                        question: question.to_owned(),
                        options,
                    });
                }
                if PollOption::is_seeded(message) {
                    options.push(PollOption::from_message(message));
                }
            }
        }
    }

    Err(PollScanError::NoPollFound)
}

/// One entry of a ranked results listing. Tied scores share a rank and the
/// next distinct score resumes after the whole tie group.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedOption {
    pub rank: usize,
    pub score: f64,
    pub option: PollOption,
}

/// Sorts options by score descending (ties by display text ascending) and
/// assigns tie-grouped ranks: scores [10, 10, 5] rank as [1, 1, 3].
pub fn rank_options(options: &[PollOption], policy: RankingPolicy) -> Vec<RankedOption> {
    let mut scored: Vec<(f64, &PollOption)> =
        options.iter().map(|option| (option.score(policy), option)).collect();
    scored.sort_by(|left, right| {
        right
            .0
            .partial_cmp(&left.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.1.text.cmp(&right.1.text))
    });

    let mut ranked = Vec::with_capacity(scored.len());
    let mut rank = 1usize;
    let mut index = 0usize;
    while index < scored.len() {
        let group_score = scored[index].0;
        let group_len =
            scored[index..].iter().take_while(|(score, _)| *score == group_score).count();
        for (score, option) in &scored[index..index + group_len] {
            ranked.push(RankedOption { rank, score: *score, option: (*option).clone() });
        }
        rank += group_len;
        index += group_len;
    }
    ranked
}

/// Results listing posted back to the channel, one numbered line per option.
pub fn results_summary(
    question: &str,
    ranked: &[RankedOption],
    policy: RankingPolicy,
) -> String {
    let mut summary = format!("Results for: **{question}**");
    for entry in ranked {
        summary.push_str(&format!("\n{}. {}", entry.rank, entry.option.summary_line(policy)));
    }
    summary
}

fn format_score(score: f64) -> String {
    if (score - score.round()).abs() < 1e-9 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

/// A medal reaction to add to (or clear from) one option message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedalAward {
    pub message_id: String,
    pub emoji: String,
}

/// The clear-then-add reaction work for one results refresh. Clearing first
/// keeps stale medals from surviving a re-rank; a reaction changing between
/// the clear and the add is an accepted race.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MedalRefresh {
    pub clear: Vec<MedalAward>,
    pub add: Vec<MedalAward>,
}

/// Awards medals to rank groups 1..=3. A tie group straddling the cutoff
/// still receives its medal; groups whose rank exceeds the medal count get
/// nothing.
pub fn plan_medal_refresh(ranked: &[RankedOption]) -> MedalRefresh {
    let mut refresh = MedalRefresh::default();
    for entry in ranked {
        for medal in &entry.option.own_medals {
            refresh.clear.push(MedalAward {
                message_id: entry.option.message_id.clone(),
                emoji: medal.clone(),
            });
        }
        if entry.rank <= MEDAL_EMOJIS.len() {
            refresh.add.push(MedalAward {
                message_id: entry.option.message_id.clone(),
                emoji: MEDAL_EMOJIS[entry.rank - 1].to_owned(),
            });
        }
    }
    refresh
}
