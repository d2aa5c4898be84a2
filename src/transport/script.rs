//! Scripted in-process transport.
//!
//! Records every outbound call and replays configured outcomes. Used by the
//! test suite and the console harness; never touches a network.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ChatRef, Keyboard, MembershipStatus, MessageRef, Transport, TransportError};
use crate::catalog::FileRef;

/// What kind of payload a recorded send carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKind {
    Text,
    Photo,
    Video,
    Document,
}

/// One recorded outbound message.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: ChatRef,
    pub kind: SentKind,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, Default)]
struct State {
    next_message_id: i64,
    sent: Vec<SentMessage>,
    copies: Vec<(i64, MessageRef)>,
    edits: Vec<(MessageRef, String)>,
    copy_failures: HashMap<i64, TransportError>,
    memberships: HashMap<(i64, i64), Result<MembershipStatus, TransportError>>,
    handles: HashMap<i64, String>,
    fail_edits: bool,
    fail_sends: bool,
    fail_videos: bool,
}

/// Deterministic [`Transport`] for tests.
///
/// Unscripted membership queries answer [`MembershipStatus::Member`];
/// unscripted sends and copies succeed.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    state: Mutex<State>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `copy_message` to the given recipient fail with `error`.
    pub async fn fail_copies_for(&self, actor_id: i64, error: TransportError) {
        self.state.lock().await.copy_failures.insert(actor_id, error);
    }

    /// Scripts a membership answer for one (channel, actor) pair.
    pub async fn set_membership(&self, channel_id: i64, actor_id: i64, status: MembershipStatus) {
        self.state
            .lock()
            .await
            .memberships
            .insert((channel_id, actor_id), Ok(status));
    }

    /// Makes the membership query for one (channel, actor) pair fail.
    pub async fn fail_membership(&self, channel_id: i64, actor_id: i64) {
        self.state.lock().await.memberships.insert(
            (channel_id, actor_id),
            Err(TransportError::Failed("scripted query failure".to_owned())),
        );
    }

    /// Registers a public handle for a channel id.
    pub async fn set_handle(&self, channel_id: i64, handle: impl Into<String>) {
        self.state.lock().await.handles.insert(channel_id, handle.into());
    }

    /// Makes every `edit_text` fail, as if the target message was deleted.
    pub async fn set_fail_edits(&self, fail: bool) {
        self.state.lock().await.fail_edits = fail;
    }

    /// Makes every send fail.
    pub async fn set_fail_sends(&self, fail: bool) {
        self.state.lock().await.fail_sends = fail;
    }

    /// Makes `send_video` fail with a bad request, as if the stored file
    /// reference is not playable as a video.
    pub async fn set_fail_videos(&self, fail: bool) {
        self.state.lock().await.fail_videos = fail;
    }

    /// Everything sent so far, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().await.sent.clone()
    }

    /// Every successful relay-copy so far, in order.
    pub async fn copies(&self) -> Vec<(i64, MessageRef)> {
        self.state.lock().await.copies.clone()
    }

    /// Every successful edit so far, in order.
    pub async fn edits(&self) -> Vec<(MessageRef, String)> {
        self.state.lock().await.edits.clone()
    }

    async fn record_send(
        &self,
        to: &ChatRef,
        kind: SentKind,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let mut state = self.state.lock().await;
        if state.fail_sends {
            return Err(TransportError::Failed("scripted send failure".to_owned()));
        }

        state.next_message_id += 1;
        let chat_id = match to {
            ChatRef::Id(id) => *id,
            // Handle-addressed chats share one synthetic id in the script.
            ChatRef::Handle(_) => 0,
        };
        state.sent.push(SentMessage {
            to: to.clone(),
            kind,
            text: text.to_owned(),
            keyboard,
        });
        Ok(MessageRef {
            chat_id,
            message_id: state.next_message_id,
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_text(
        &self,
        to: &ChatRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.record_send(to, SentKind::Text, text, keyboard).await
    }

    async fn send_photo(
        &self,
        to: &ChatRef,
        _photo: &FileRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.record_send(to, SentKind::Photo, caption, keyboard).await
    }

    async fn send_video(
        &self,
        to: &ChatRef,
        _video: &FileRef,
        _thumbnail: Option<&FileRef>,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        if self.state.lock().await.fail_videos {
            return Err(TransportError::BadRequest(
                "file is not a playable video".to_owned(),
            ));
        }
        self.record_send(to, SentKind::Video, caption, keyboard).await
    }

    async fn send_document(
        &self,
        to: &ChatRef,
        _document: &FileRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.record_send(to, SentKind::Document, caption, keyboard).await
    }

    async fn copy_message(&self, to: i64, source: MessageRef) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.copy_failures.get(&to) {
            return Err(err.clone());
        }
        state.copies.push((to, source));
        Ok(())
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if state.fail_edits {
            return Err(TransportError::BadRequest(
                "message to edit not found".to_owned(),
            ));
        }
        state.edits.push((message, text.to_owned()));
        Ok(())
    }

    async fn member_status(
        &self,
        channel_id: i64,
        actor_id: i64,
    ) -> Result<MembershipStatus, TransportError> {
        let state = self.state.lock().await;
        state
            .memberships
            .get(&(channel_id, actor_id))
            .cloned()
            .unwrap_or(Ok(MembershipStatus::Member))
    }

    async fn channel_handle(&self, channel_id: i64) -> Result<Option<String>, TransportError> {
        let state = self.state.lock().await;
        Ok(state.handles.get(&channel_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_copy_failure() {
        let transport = ScriptedTransport::new();
        transport.fail_copies_for(2, TransportError::Forbidden).await;

        let source = MessageRef {
            chat_id: 1,
            message_id: 1,
        };
        assert!(transport.copy_message(1, source).await.is_ok());
        assert_eq!(
            transport.copy_message(2, source).await,
            Err(TransportError::Forbidden)
        );
        assert_eq!(transport.copies().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unscripted_membership_defaults_to_member() {
        let transport = ScriptedTransport::new();
        assert_eq!(
            transport.member_status(-100, 1).await,
            Ok(MembershipStatus::Member)
        );

        transport.set_membership(-100, 1, MembershipStatus::Left).await;
        assert_eq!(
            transport.member_status(-100, 1).await,
            Ok(MembershipStatus::Left)
        );
    }
}
