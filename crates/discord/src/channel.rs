use async_trait::async_trait;
use thiserror::Error;

use freshcut_core::history::ChannelMessage;

use crate::messages::OutboundMessage;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel api call failed: {0}")]
    Api(String),
}

/// Handle to a message the bot just sent, for follow-up reactions or edits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub id: String,
}

/// Seam to the platform's channel REST surface. Every operation the core
/// flows need, nothing more: send/edit, a history page, and reaction
/// add/remove.
#[async_trait]
pub trait ChannelApi: Send + Sync {
    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<SentMessage, ChannelError>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), ChannelError>;

    /// Recent messages, newest first, at most `limit`.
    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>, ChannelError>;

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ChannelError>;

    async fn remove_own_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ChannelError>;
}

/// Stand-in used until a real transport is wired and in tests that do not
/// care about channel traffic.
#[derive(Default)]
pub struct NoopChannelApi;

#[async_trait]
impl ChannelApi for NoopChannelApi {
    async fn send_message(
        &self,
        _channel_id: &str,
        _message: &OutboundMessage,
    ) -> Result<SentMessage, ChannelError> {
        Ok(SentMessage { id: "noop".to_owned() })
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
        _limit: usize,
    ) -> Result<Vec<ChannelMessage>, ChannelError> {
        Ok(Vec::new())
    }

    async fn add_reaction(
        &self,
        _channel_id: &str,
        _message_id: &str,
        _emoji: &str,
    ) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn remove_own_reaction(
        &self,
        _channel_id: &str,
        _message_id: &str,
        _emoji: &str,
    ) -> Result<(), ChannelError> {
        Ok(())
    }
}
