//! Broadcast dispatch to the full actor roster.
//!
//! Relays one source message to every known actor sequentially, pacing
//! each attempt with a fixed delay and sorting outcomes into the three
//! buckets the admin summary reports.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::{CatalogStore, StoreError};
use crate::format;
use crate::transport::{ChatRef, MessageRef, Transport, TransportError};

/// How many attempts pass between progress-message updates.
const PROGRESS_EVERY: u64 = 50;

/// Final tally of one broadcast run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Deliveries that went through.
    pub sent: u64,
    /// Recipients that forbid delivery; likely gone for good.
    pub blocked: u64,
    /// Every other delivery failure.
    pub failed: u64,
    /// Size of the roster snapshot the run worked from.
    pub total: u64,
}

impl BroadcastReport {
    /// Renders the admin-facing summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "📣 Broadcast finished\n\n\
             ✅ Sent: {}\n\
             🚫 Blocked: {}\n\
             ⚠️ Failed: {}\n\
             👥 Total: {}",
            format::format_number(self.sent),
            format::format_number(self.blocked),
            format::format_number(self.failed),
            format::format_number(self.total)
        )
    }
}

/// Sequential broadcast dispatcher.
pub struct BroadcastDispatcher {
    store: Arc<dyn CatalogStore>,
    transport: Arc<dyn Transport>,
    delay: Duration,
}

impl BroadcastDispatcher {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, transport: Arc<dyn Transport>, delay: Duration) -> Self {
        Self {
            store,
            transport,
            delay,
        }
    }

    /// Relays `source` to every actor known at the start of the run.
    ///
    /// The roster is snapshotted once; actors registering mid-run are not
    /// picked up. Progress is posted to `status_chat` every
    /// [`PROGRESS_EVERY`] attempts and again after the final one;
    /// progress-UI failures never abort the run. Only a roster read
    /// failure does.
    pub async fn broadcast(
        &self,
        source: MessageRef,
        status_chat: i64,
    ) -> Result<BroadcastReport, StoreError> {
        let roster = self.store.actor_ids().await?;
        let total = roster.len() as u64;

        info!("Broadcast started: {} recipients", total);

        let progress = match self
            .transport
            .send_text(
                &ChatRef::Id(status_chat),
                &progress_text(0, total),
                None,
            )
            .await
        {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Could not create broadcast progress message: {}", e);
                None
            }
        };

        let mut report = BroadcastReport {
            total,
            ..BroadcastReport::default()
        };
        let mut attempted: u64 = 0;

        for actor_id in roster {
            match self.transport.copy_message(actor_id, source).await {
                Ok(()) => report.sent += 1,
                Err(TransportError::Forbidden) => report.blocked += 1,
                Err(e) => {
                    warn!("Broadcast delivery to {} failed: {}", actor_id, e);
                    report.failed += 1;
                }
            }
            attempted += 1;

            if (attempted % PROGRESS_EVERY == 0 || attempted == total)
                && let Some(message) = progress
                && let Err(e) = self
                    .transport
                    .edit_text(message, &progress_text(attempted, total))
                    .await
            {
                warn!("Broadcast progress update failed: {}", e);
            }

            tokio::time::sleep(self.delay).await;
        }

        if let Some(message) = progress
            && let Err(e) = self.transport.edit_text(message, &report.summary()).await
        {
            warn!("Broadcast summary update failed: {}", e);
        }

        info!(
            "Broadcast finished: sent={} blocked={} failed={} total={}",
            report.sent, report.blocked, report.failed, report.total
        );
        Ok(report)
    }
}

fn progress_text(attempted: u64, total: u64) -> String {
    format!(
        "📣 Broadcasting...\n\n{}\n{} / {}",
        format::progress_bar(attempted, total),
        attempted,
        total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStore;
    use crate::transport::ScriptedTransport;

    const ADMIN_CHAT: i64 = 1;

    fn source() -> MessageRef {
        MessageRef {
            chat_id: ADMIN_CHAT,
            message_id: 42,
        }
    }

    async fn seed_actors(store: &MemoryStore, ids: &[i64]) {
        for id in ids {
            store.upsert_actor(*id, None, None).await.expect("actor");
        }
    }

    fn dispatcher(
        store: &Arc<MemoryStore>,
        transport: &Arc<ScriptedTransport>,
    ) -> BroadcastDispatcher {
        BroadcastDispatcher::new(store.clone(), transport.clone(), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_outcomes_fall_into_three_buckets() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::new());
        seed_actors(&store, &[10, 11, 12, 13, 14, 15]).await;
        transport
            .fail_copies_for(11, TransportError::Forbidden)
            .await;
        transport
            .fail_copies_for(13, TransportError::Failed("flood".to_owned()))
            .await;
        transport
            .fail_copies_for(14, TransportError::BadRequest("gone".to_owned()))
            .await;

        let report = dispatcher(&store, &transport)
            .broadcast(source(), ADMIN_CHAT)
            .await
            .expect("broadcast");

        assert_eq!(
            report,
            BroadcastReport {
                sent: 3,
                blocked: 1,
                failed: 2,
                total: 6,
            }
        );
        assert_eq!(report.sent + report.blocked + report.failed, report.total);

        // Only the reachable actors received the relay.
        let recipients: Vec<i64> = transport.copies().await.iter().map(|(to, _)| *to).collect();
        assert_eq!(recipients, vec![10, 12, 15]);
    }

    #[tokio::test]
    async fn test_one_blocked_recipient_out_of_three() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::new());
        seed_actors(&store, &[10, 11, 12]).await;
        transport
            .fail_copies_for(11, TransportError::Forbidden)
            .await;

        let report = dispatcher(&store, &transport)
            .broadcast(source(), ADMIN_CHAT)
            .await
            .expect("broadcast");
        assert_eq!(
            report,
            BroadcastReport {
                sent: 2,
                blocked: 1,
                failed: 0,
                total: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_roster_reports_zeroes() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::new());

        let report = dispatcher(&store, &transport)
            .broadcast(source(), ADMIN_CHAT)
            .await
            .expect("broadcast");
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_progress_updates_every_fifty_and_final_summary() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::new());
        let ids: Vec<i64> = (100..220).collect();
        seed_actors(&store, &ids).await;

        let report = dispatcher(&store, &transport)
            .broadcast(source(), ADMIN_CHAT)
            .await
            .expect("broadcast");
        assert_eq!(report.sent, 120);

        // Interim updates after 50 and 100, one on the final id, then the
        // summary.
        let edits = transport.edits().await;
        assert_eq!(edits.len(), 4);
        assert!(edits[0].1.contains("50 / 120"));
        assert!(edits[1].1.contains("100 / 120"));
        assert!(edits[2].1.contains("120 / 120"));
        assert!(edits[3].1.contains("✅ Sent: 120"));
    }

    #[tokio::test]
    async fn test_progress_failures_never_abort_the_run() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::new());
        let ids: Vec<i64> = (100..180).collect();
        seed_actors(&store, &ids).await;
        transport.set_fail_edits(true).await;

        let report = dispatcher(&store, &transport)
            .broadcast(source(), ADMIN_CHAT)
            .await
            .expect("broadcast");
        assert_eq!(report.sent, 80);
        assert!(transport.edits().await.is_empty());
    }

    #[tokio::test]
    async fn test_runs_even_when_progress_message_cannot_be_created() {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::new());
        seed_actors(&store, &[10, 11]).await;
        transport.set_fail_sends(true).await;

        let report = dispatcher(&store, &transport)
            .broadcast(source(), ADMIN_CHAT)
            .await
            .expect("broadcast");
        assert_eq!(report.sent, 2);
        assert_eq!(transport.copies().await.len(), 2);
    }
}
