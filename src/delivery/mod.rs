//! Code-based content delivery.
//!
//! The user-facing core path: a numeric code (typed directly or carried by
//! a `code_<n>` deep-link start parameter) is gated, resolved, counted and
//! delivered with a stats caption and rating buttons.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::catalog::{CatalogEntry, CatalogStore, StoreError};
use crate::format;
use crate::gate::{SubscriptionCheck, SubscriptionGate};
use crate::rating::{MAX_SCORE, MIN_SCORE};
use crate::transport::{Button, ChatRef, Keyboard, Transport, TransportError};

/// Delivery failures.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// What a delivery request resolved to.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The entry was sent to the actor; carries the post-view entry state.
    Delivered(CatalogEntry),
    /// The subscription gate held the request back.
    NotSubscribed(SubscriptionCheck),
    /// No active entry carries the code.
    NotFound(i64),
}

/// Resolves codes to entries and ships them to actors.
pub struct ContentDelivery {
    store: Arc<dyn CatalogStore>,
    transport: Arc<dyn Transport>,
    gate: Arc<SubscriptionGate>,
}

impl ContentDelivery {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        transport: Arc<dyn Transport>,
        gate: Arc<SubscriptionGate>,
    ) -> Self {
        Self {
            store,
            transport,
            gate,
        }
    }

    /// Delivers the entry behind `code` to the actor.
    ///
    /// The gate runs first; a held-back request records nothing. A found
    /// entry counts one view before the file goes out, so the caption
    /// already shows the new total.
    pub async fn deliver(
        &self,
        actor_id: i64,
        code: i64,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let check = self.gate.check(actor_id).await?;
        if !check.is_satisfied() {
            return Ok(DeliveryOutcome::NotSubscribed(check));
        }

        let Some(mut entry) = self.store.entry_by_code(code).await? else {
            return Ok(DeliveryOutcome::NotFound(code));
        };

        self.store.record_view(actor_id, code).await?;
        if let Some(fresh) = self.store.entry_by_code(code).await? {
            entry = fresh;
        }

        let summary = self.store.rating_summary(code).await?;
        let caption = format::entry_caption(&entry, Some(&summary), true);
        let keyboard = rate_keyboard(code);

        self.send_entry(actor_id, &entry, &caption, keyboard).await?;
        Ok(DeliveryOutcome::Delivered(entry))
    }

    /// Handles a `/start` parameter; `None` when it carries no code payload.
    pub async fn deliver_start(
        &self,
        actor_id: i64,
        param: &str,
    ) -> Result<Option<DeliveryOutcome>, DeliveryError> {
        match format::parse_start_code(param) {
            Some(code) => Ok(Some(self.deliver(actor_id, code).await?)),
            None => Ok(None),
        }
    }

    /// Sends the entry file, falling back from video to document when the
    /// stored reference is not playable.
    async fn send_entry(
        &self,
        actor_id: i64,
        entry: &CatalogEntry,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<(), TransportError> {
        let to = ChatRef::Id(actor_id);
        match self
            .transport
            .send_video(
                &to,
                &entry.file,
                entry.thumbnail.as_ref(),
                caption,
                Some(keyboard.clone()),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(TransportError::BadRequest(reason)) => {
                warn!(
                    "Entry {} not sendable as video ({}), falling back to document",
                    entry.code, reason
                );
                self.transport
                    .send_document(&to, &entry.file, caption, Some(keyboard))
                    .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Callback payload for a rating button press.
#[must_use]
pub fn rate_callback(code: i64, score: u8) -> String {
    format!("rate_{code}_{score}")
}

/// Parses a rating-button callback payload.
#[must_use]
pub fn parse_rate_callback(payload: &str) -> Option<(i64, u8)> {
    let rest = payload.strip_prefix("rate_")?;
    let (code, score) = rest.split_once('_')?;
    Some((code.parse().ok()?, score.parse().ok()?))
}

/// One row of 1..=5 star buttons for the entry.
fn rate_keyboard(code: i64) -> Keyboard {
    Keyboard::row(
        (MIN_SCORE..=MAX_SCORE)
            .map(|score| Button::callback(format!("{score}⭐"), rate_callback(code, score)))
            .collect(),
    )
}
