//! Storage collaborator surface.

use async_trait::async_trait;
use thiserror::Error;

use super::entry::{CatalogEntry, NewEntry, Rating, RatingSummary, RequiredChannel};

/// Errors surfaced by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An active entry already owns the requested code.
    #[error("code {0} is already taken")]
    DuplicateCode(i64),

    /// The channel is already in the required set.
    #[error("channel {0} is already required")]
    DuplicateChannel(i64),

    /// No active entry carries the given code.
    #[error("no entry with code {0}")]
    UnknownCode(i64),

    /// Any other storage failure, reported verbatim.
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Totals shown on the admin panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalStats {
    pub actors: u64,
    pub entries: u64,
    pub total_views: u64,
}

/// Per-actor activity totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorStats {
    pub views: u64,
    pub ratings: u64,
}

/// Query/command surface over the persistent entities.
///
/// Every method is a single storage operation; no transaction spans two
/// calls. The only multi-step mutation, [`record_view`](Self::record_view),
/// documents its own non-atomicity.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Actors ---

    /// Creates or refreshes an actor row; `last_active` is bumped either way.
    async fn upsert_actor(
        &self,
        actor_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Snapshot of every known actor id, in insertion order.
    async fn actor_ids(&self) -> Result<Vec<i64>, StoreError>;

    async fn actor_count(&self) -> Result<u64, StoreError>;

    /// Actors active within the last `days` days.
    async fn active_actor_count(&self, days: i64) -> Result<u64, StoreError>;

    // --- Entries ---

    /// Inserts a new entry; rejects when an active entry owns the code.
    async fn insert_entry(&self, draft: NewEntry) -> Result<CatalogEntry, StoreError>;

    /// Looks up an entry by code, active entries only.
    async fn entry_by_code(&self, code: i64) -> Result<Option<CatalogEntry>, StoreError>;

    /// Title/genre substring search over active entries, most viewed first.
    async fn search_entries(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Most viewed active entries.
    async fn top_entries(&self, limit: usize) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Most recently added active entries.
    async fn recent_entries(&self, limit: usize) -> Result<Vec<CatalogEntry>, StoreError>;

    async fn entry_count(&self) -> Result<u64, StoreError>;

    /// Soft delete: flips the tombstone flag, historical references stay valid.
    async fn deactivate_entry(&self, code: i64) -> Result<(), StoreError>;

    // --- Required channels ---

    /// Active required channels, descending priority.
    async fn required_channels(&self) -> Result<Vec<RequiredChannel>, StoreError>;

    async fn count_required_channels(&self) -> Result<u64, StoreError>;

    async fn add_required_channel(
        &self,
        channel_id: i64,
        title: &str,
        priority: i32,
    ) -> Result<(), StoreError>;

    async fn remove_required_channel(&self, channel_id: i64) -> Result<(), StoreError>;

    // --- Views & ratings ---

    /// Appends a view event and bumps the entry's view counter.
    ///
    /// These are two separate operations; a crash between them undercounts
    /// views. Accepted, not corrected.
    async fn record_view(&self, actor_id: i64, code: i64) -> Result<(), StoreError>;

    /// Upserts the (actor, code) rating; a second rating overwrites the first.
    async fn upsert_rating(
        &self,
        actor_id: i64,
        code: i64,
        score: u8,
        review: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Aggregate over all ratings for the entry (mean to one decimal, count).
    async fn rating_summary(&self, code: i64) -> Result<RatingSummary, StoreError>;

    /// The actor's own rating for the entry, if any.
    async fn actor_rating(&self, actor_id: i64, code: i64) -> Result<Option<Rating>, StoreError>;

    // --- Statistics ---

    async fn global_stats(&self) -> Result<GlobalStats, StoreError>;

    async fn actor_stats(&self, actor_id: i64) -> Result<ActorStats, StoreError>;
}
