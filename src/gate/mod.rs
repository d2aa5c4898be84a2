//! Subscription gating against the required-channel set.
//!
//! Content delivery is held back until the actor is a member of every
//! active required channel. The check fails closed: a channel whose
//! membership cannot be determined counts as not joined.

use std::sync::Arc;

use tracing::warn;

use crate::catalog::{CatalogStore, RequiredChannel, StoreError};
use crate::format;
use crate::transport::{Button, Keyboard, Transport};

/// Callback payload for the "I joined, check again" button.
pub const RECHECK_CALLBACK: &str = "check_fsub";

/// Outcome of one gate evaluation.
#[derive(Debug, Clone)]
pub struct SubscriptionCheck {
    /// Channels the actor has not verifiably joined, descending priority.
    pub unresolved: Vec<RequiredChannel>,
}

impl SubscriptionCheck {
    /// Whether the actor may receive content.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Evaluates required-channel membership for actors.
pub struct SubscriptionGate {
    store: Arc<dyn CatalogStore>,
    transport: Arc<dyn Transport>,
}

impl SubscriptionGate {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// Checks the actor against every active required channel.
    ///
    /// An empty required set always passes. A failed membership query is
    /// logged and the channel lands in the unresolved list.
    pub async fn check(&self, actor_id: i64) -> Result<SubscriptionCheck, StoreError> {
        let channels = self.store.required_channels().await?;
        let mut unresolved = Vec::new();

        for channel in channels {
            match self
                .transport
                .member_status(channel.channel_id, actor_id)
                .await
            {
                Ok(status) if status.is_member() => {}
                Ok(_) => unresolved.push(channel),
                Err(e) => {
                    warn!(
                        "Membership query failed for channel {}: {}",
                        channel.channel_id, e
                    );
                    unresolved.push(channel);
                }
            }
        }

        Ok(SubscriptionCheck { unresolved })
    }

    /// Builds the join prompt keyboard for a failed check.
    ///
    /// One link button per unresolved channel, plus a re-check callback
    /// button at the bottom. Handle resolution failures fall back to the
    /// id-derived link.
    pub async fn join_keyboard(&self, check: &SubscriptionCheck) -> Keyboard {
        let mut buttons = Vec::with_capacity(check.unresolved.len() + 1);

        for channel in &check.unresolved {
            let handle = match self.transport.channel_handle(channel.channel_id).await {
                Ok(handle) => handle,
                Err(_) => None,
            };
            let link = format::channel_link(channel.channel_id, handle.as_deref());
            buttons.push(Button::url(format!("📢 {}", channel.title), link));
        }
        buttons.push(Button::callback("✅ I joined", RECHECK_CALLBACK));

        Keyboard::column(buttons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStore;
    use crate::transport::{ButtonAction, MembershipStatus, ScriptedTransport};

    fn fixtures() -> (Arc<MemoryStore>, Arc<ScriptedTransport>, SubscriptionGate) {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::new());
        let gate = SubscriptionGate::new(store.clone(), transport.clone());
        (store, transport, gate)
    }

    #[tokio::test]
    async fn test_empty_required_set_is_satisfied() {
        let (_store, _transport, gate) = fixtures();
        let check = gate.check(7).await.expect("check");
        assert!(check.is_satisfied());
    }

    #[tokio::test]
    async fn test_left_and_kicked_members_are_unresolved() {
        let (store, transport, gate) = fixtures();
        store
            .add_required_channel(-100, "News", 2)
            .await
            .expect("add");
        store
            .add_required_channel(-200, "Chat", 1)
            .await
            .expect("add");
        transport
            .set_membership(-100, 7, MembershipStatus::Left)
            .await;
        transport
            .set_membership(-200, 7, MembershipStatus::Kicked)
            .await;

        let check = gate.check(7).await.expect("check");
        assert!(!check.is_satisfied());
        let ids: Vec<i64> = check.unresolved.iter().map(|c| c.channel_id).collect();
        assert_eq!(ids, vec![-100, -200]);
    }

    #[tokio::test]
    async fn test_membership_query_failure_fails_closed() {
        let (store, transport, gate) = fixtures();
        store
            .add_required_channel(-100, "News", 0)
            .await
            .expect("add");
        transport.fail_membership(-100, 7).await;

        let check = gate.check(7).await.expect("check");
        assert!(!check.is_satisfied());
        assert_eq!(check.unresolved[0].channel_id, -100);
    }

    #[tokio::test]
    async fn test_member_statuses_pass() {
        let (store, transport, gate) = fixtures();
        store
            .add_required_channel(-100, "News", 0)
            .await
            .expect("add");
        store
            .add_required_channel(-200, "Chat", 0)
            .await
            .expect("add");
        transport
            .set_membership(-100, 7, MembershipStatus::Member)
            .await;
        transport
            .set_membership(-200, 7, MembershipStatus::Administrator)
            .await;

        let check = gate.check(7).await.expect("check");
        assert!(check.is_satisfied());
    }

    #[tokio::test]
    async fn test_join_keyboard_links_each_channel_and_recheck() {
        let (store, transport, gate) = fixtures();
        store
            .add_required_channel(-1001234567, "News", 0)
            .await
            .expect("add");
        transport
            .set_membership(-1001234567, 7, MembershipStatus::Left)
            .await;
        transport.set_handle(-1001234567, "movies").await;

        let check = gate.check(7).await.expect("check");
        let keyboard = gate.join_keyboard(&check).await;
        assert_eq!(keyboard.rows.len(), 2);

        match &keyboard.rows[0][0].action {
            ButtonAction::Url(url) => assert_eq!(url, "https://t.me/movies"),
            ButtonAction::Callback(_) => panic!("expected url button"),
        }
        match &keyboard.rows[1][0].action {
            ButtonAction::Callback(payload) => assert_eq!(payload, RECHECK_CALLBACK),
            ButtonAction::Url(_) => panic!("expected callback button"),
        }
    }
}
