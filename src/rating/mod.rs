//! Rating capture for catalog entries.

use thiserror::Error;

use crate::catalog::{CatalogStore, RatingSummary, StoreError};

/// Inclusive score bounds.
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Why a rating was not recorded.
#[derive(Debug, Error)]
pub enum RatingError {
    /// Score outside 1..=5.
    #[error("score {0} is out of range ({MIN_SCORE}..={MAX_SCORE})")]
    InvalidScore(u8),

    /// No active entry carries the code.
    #[error("no entry with code {0}")]
    UnknownCode(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Records (or overwrites) an actor's rating for an entry and returns the
/// refreshed aggregate.
///
/// One rating per (actor, entry); a repeat submission replaces the score
/// and review rather than adding a second row.
pub async fn rate(
    store: &dyn CatalogStore,
    actor_id: i64,
    code: i64,
    score: u8,
    review: Option<&str>,
) -> Result<RatingSummary, RatingError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(RatingError::InvalidScore(score));
    }
    if store.entry_by_code(code).await?.is_none() {
        return Err(RatingError::UnknownCode(code));
    }

    store.upsert_rating(actor_id, code, score, review).await?;
    Ok(store.rating_summary(code).await?)
}
