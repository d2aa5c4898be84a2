//! Messaging transport collaborator boundary.
//!
//! The bot core never talks to the wire directly; it issues deliveries,
//! relays and membership queries through the [`Transport`] trait. Transport
//! failures form a closed taxonomy so that "blocked" versus "other failure"
//! is a contract, not an incidental exception-type check.

mod script;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::FileRef;

pub use script::{ScriptedTransport, SentKind, SentMessage};

/// Errors surfaced by the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The recipient has blocked the bot or otherwise forbids delivery.
    /// Likely persistent unreachability.
    #[error("delivery forbidden by recipient")]
    Forbidden,

    /// Malformed request, e.g. the target chat or message does not exist.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any other delivery or query failure.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Where an outgoing message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRef {
    /// A direct chat with an actor (or any chat known by numeric id).
    Id(i64),
    /// A channel addressed by public handle, e.g. `@movies`.
    Handle(String),
}

impl From<i64> for ChatRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

/// Reference to a delivered message, enough to edit or relay it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Membership status of an actor in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MembershipStatus {
    /// `left` and `kicked` count as non-membership; everything else passes.
    #[must_use]
    pub const fn is_member(self) -> bool {
        !matches!(self, Self::Left | Self::Kicked)
    }
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Opens an external link.
    Url(String),
    /// Sends a callback payload back to the bot.
    Callback(String),
}

/// One inline action affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    /// Creates a link button.
    #[must_use]
    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    /// Creates a callback button.
    #[must_use]
    pub fn callback(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(payload.into()),
        }
    }
}

/// Inline keyboard attached to an outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Builds a keyboard with one button per row.
    #[must_use]
    pub fn column(buttons: Vec<Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// Builds a keyboard with a single row.
    #[must_use]
    pub fn row(buttons: Vec<Button>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }
}

/// Outbound messaging and channel-query surface.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a text message.
    async fn send_text(
        &self,
        to: &ChatRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    /// Sends a photo with a caption.
    async fn send_photo(
        &self,
        to: &ChatRef,
        photo: &FileRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    /// Sends a video with a caption and optional thumbnail.
    async fn send_video(
        &self,
        to: &ChatRef,
        video: &FileRef,
        thumbnail: Option<&FileRef>,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    /// Sends a document with a caption.
    async fn send_document(
        &self,
        to: &ChatRef,
        document: &FileRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    /// Relay-copies an existing message to a new recipient.
    async fn copy_message(&self, to: i64, source: MessageRef) -> Result<(), TransportError>;

    /// Replaces the text of an already delivered message.
    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError>;

    /// Queries an actor's membership status in a channel.
    async fn member_status(
        &self,
        channel_id: i64,
        actor_id: i64,
    ) -> Result<MembershipStatus, TransportError>;

    /// Resolves a channel's public handle, if it has one.
    async fn channel_handle(&self, channel_id: i64) -> Result<Option<String>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_classification() {
        assert!(MembershipStatus::Member.is_member());
        assert!(MembershipStatus::Administrator.is_member());
        assert!(MembershipStatus::Restricted.is_member());
        assert!(!MembershipStatus::Left.is_member());
        assert!(!MembershipStatus::Kicked.is_member());
    }

    #[test]
    fn test_keyboard_column_layout() {
        let kb = Keyboard::column(vec![
            Button::url("a", "https://example.com"),
            Button::callback("b", "noop"),
        ]);
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.rows[0].len(), 1);
    }
}
