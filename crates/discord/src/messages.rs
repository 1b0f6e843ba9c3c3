use serde::Serialize;

use freshcut_core::scrape::card::{Card, CardField};

/// Embed payload in the shape the platform REST API accepts. Optional
/// pieces are skipped entirely rather than sent as null.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl From<Card> for Embed {
    fn from(card: Card) -> Self {
        Self {
            title: Some(card.title),
            description: card.description,
            color: card.color,
            fields: card.fields.into_iter().map(EmbedField::from).collect(),
            image: card.image_url.map(|url| EmbedImage { url }),
            footer: card
                .footer
                .map(|footer| EmbedFooter { text: footer.text, icon_url: footer.icon_url }),
        }
    }
}

impl From<CardField> for EmbedField {
    fn from(field: CardField) -> Self {
        Self { name: field.name, value: field.value, inline: field.inline }
    }
}

/// Button attached to a message; clicks come back as component
/// interactions keyed by `custom_id` with the value as payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageButton {
    pub custom_id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// One outbound message. Multi-part replies are sent first-message-first so
/// readers see the parts in logical order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
    /// Message this one replies to, rendered as a reply link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_message_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<MessageButton>,
    /// Visible only to the invoking user; used for acks and error notices.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ephemeral: bool,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }

    pub fn card(card: Card) -> Self {
        Self { embed: Some(Embed::from(card)), ..Self::default() }
    }

    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.reference_message_id = Some(message_id.into());
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn with_button(mut self, button: MessageButton) -> Self {
        self.buttons.push(button);
        self
    }
}

/// Short user-visible notice for a handled failure.
pub fn notice(text: impl Into<String>) -> OutboundMessage {
    OutboundMessage::text(text).ephemeral()
}
