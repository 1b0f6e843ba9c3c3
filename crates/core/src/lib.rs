pub mod calendar;
pub mod config;
pub mod errors;
pub mod history;
pub mod polls;
pub mod scrape;
pub mod splitter;

pub use calendar::{Attendee, CalendarEvent, CalendarSource, ReminderTarget, ResponseStatus};
pub use errors::{ExtractError, LookupError};
pub use history::{ChannelMessage, ReactionTally};
pub use polls::{PollConfig, PollSnapshot, RankedOption, RankingPolicy};
pub use scrape::card::{Card, CardField, CardFooter};
pub use scrape::PageFetcher;
pub use splitter::smart_split;
