//! In-memory reference store with optional JSON snapshot persistence.

use std::path::Path;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::entry::{
    Actor, CatalogEntry, NewEntry, Rating, RatingSummary, RequiredChannel, ViewEvent,
};
use super::store::{ActorStats, CatalogStore, GlobalStats, StoreError};

/// Everything the store holds, in declaration order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Inner {
    actors: Vec<Actor>,
    entries: Vec<CatalogEntry>,
    channels: Vec<RequiredChannel>,
    views: Vec<ViewEvent>,
    ratings: Vec<Rating>,
}

/// In-memory [`CatalogStore`] used by the test suite and the console harness.
///
/// State can be snapshotted to a JSON file across runs; the snapshot is a
/// convenience, not a durability guarantee.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from a JSON snapshot, empty if the file is missing or
    /// unreadable.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let inner = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Saves the store to a JSON snapshot file.
    pub async fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let inner = self.inner.read().await;
        let json = serde_json::to_string_pretty(&*inner)?;
        std::fs::write(path, json)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn upsert_actor(
        &self,
        actor_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        if let Some(actor) = inner.actors.iter_mut().find(|a| a.id == actor_id) {
            actor.last_active = now;
            if username.is_some() {
                actor.username = username.map(str::to_owned);
            }
        } else {
            debug!("New actor {}", actor_id);
            inner.actors.push(Actor {
                id: actor_id,
                username: username.map(str::to_owned),
                first_name: first_name.map(str::to_owned),
                language: "uz".to_owned(),
                joined_at: now,
                last_active: now,
            });
        }
        Ok(())
    }

    async fn actor_ids(&self) -> Result<Vec<i64>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.actors.iter().map(|a| a.id).collect())
    }

    async fn actor_count(&self) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.actors.len() as u64)
    }

    async fn active_actor_count(&self, days: i64) -> Result<u64, StoreError> {
        let cutoff = Utc::now() - Duration::days(days);
        let inner = self.inner.read().await;
        Ok(inner
            .actors
            .iter()
            .filter(|a| a.last_active >= cutoff)
            .count() as u64)
    }

    async fn insert_entry(&self, draft: NewEntry) -> Result<CatalogEntry, StoreError> {
        let mut inner = self.inner.write().await;

        // Codes are unique among *active* entries; tombstoned codes may be reused.
        if inner
            .entries
            .iter()
            .any(|e| e.code == draft.code && e.is_active)
        {
            return Err(StoreError::DuplicateCode(draft.code));
        }

        let entry = draft.into_entry(Utc::now());
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    async fn entry_by_code(&self, code: i64) -> Result<Option<CatalogEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .find(|e| e.code == code && e.is_active)
            .cloned())
    }

    async fn search_entries(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, StoreError> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;

        let mut hits: Vec<CatalogEntry> = inner
            .entries
            .iter()
            .filter(|e| {
                e.is_active
                    && (e.title.to_lowercase().contains(&needle)
                        || e.genre.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.views.cmp(&a.views));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn top_entries(&self, limit: usize) -> Result<Vec<CatalogEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<CatalogEntry> =
            inner.entries.iter().filter(|e| e.is_active).cloned().collect();
        entries.sort_by(|a, b| b.views.cmp(&a.views));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn recent_entries(&self, limit: usize) -> Result<Vec<CatalogEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<CatalogEntry> =
            inner.entries.iter().filter(|e| e.is_active).cloned().collect();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn entry_count(&self) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.entries.iter().filter(|e| e.is_active).count() as u64)
    }

    async fn deactivate_entry(&self, code: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.code == code && e.is_active)
            .ok_or(StoreError::UnknownCode(code))?;
        entry.is_active = false;
        Ok(())
    }

    async fn required_channels(&self) -> Result<Vec<RequiredChannel>, StoreError> {
        let inner = self.inner.read().await;
        let mut channels: Vec<RequiredChannel> =
            inner.channels.iter().filter(|c| c.is_active).cloned().collect();
        channels.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(channels)
    }

    async fn count_required_channels(&self) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.channels.iter().filter(|c| c.is_active).count() as u64)
    }

    async fn add_required_channel(
        &self,
        channel_id: i64,
        title: &str,
        priority: i32,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.channels.iter().any(|c| c.channel_id == channel_id) {
            return Err(StoreError::DuplicateChannel(channel_id));
        }
        inner.channels.push(RequiredChannel {
            channel_id,
            title: title.to_owned(),
            priority,
            is_active: true,
        });
        Ok(())
    }

    async fn remove_required_channel(&self, channel_id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.channels.retain(|c| c.channel_id != channel_id);
        Ok(())
    }

    async fn record_view(&self, actor_id: i64, code: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if !inner.entries.iter().any(|e| e.code == code && e.is_active) {
            return Err(StoreError::UnknownCode(code));
        }

        // Two operations, no atomicity between them: a crash after the event
        // insert leaves the counter behind by one.
        inner.views.push(ViewEvent {
            actor_id,
            code,
            viewed_at: Utc::now(),
        });

        if let Some(entry) = inner.entries.iter_mut().find(|e| e.code == code && e.is_active) {
            entry.views += 1;
        }
        Ok(())
    }

    async fn upsert_rating(
        &self,
        actor_id: i64,
        code: i64,
        score: u8,
        review: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(rating) = inner
            .ratings
            .iter_mut()
            .find(|r| r.actor_id == actor_id && r.code == code)
        {
            rating.score = score;
            rating.review = review.map(str::to_owned);
        } else {
            inner.ratings.push(Rating {
                actor_id,
                code,
                score,
                review: review.map(str::to_owned),
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn rating_summary(&self, code: i64) -> Result<RatingSummary, StoreError> {
        let inner = self.inner.read().await;
        let scores: Vec<u8> = inner
            .ratings
            .iter()
            .filter(|r| r.code == code)
            .map(|r| r.score)
            .collect();

        if scores.is_empty() {
            return Ok(RatingSummary::default());
        }

        let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
        let raw = sum as f64 / scores.len() as f64;
        Ok(RatingSummary {
            average: (raw * 10.0).round() / 10.0,
            count: scores.len() as u64,
        })
    }

    async fn actor_rating(&self, actor_id: i64, code: i64) -> Result<Option<Rating>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .find(|r| r.actor_id == actor_id && r.code == code)
            .cloned())
    }

    async fn global_stats(&self) -> Result<GlobalStats, StoreError> {
        let inner = self.inner.read().await;
        Ok(GlobalStats {
            actors: inner.actors.len() as u64,
            entries: inner.entries.iter().filter(|e| e.is_active).count() as u64,
            total_views: inner.views.len() as u64,
        })
    }

    async fn actor_stats(&self, actor_id: i64) -> Result<ActorStats, StoreError> {
        let inner = self.inner.read().await;
        Ok(ActorStats {
            views: inner.views.iter().filter(|v| v.actor_id == actor_id).count() as u64,
            ratings: inner
                .ratings
                .iter()
                .filter(|r| r.actor_id == actor_id)
                .count() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FileRef, Quality};

    fn draft(code: i64, title: &str) -> NewEntry {
        NewEntry {
            code,
            file: FileRef::new(format!("file-{code}")),
            title: title.to_owned(),
            genre: "Drama".to_owned(),
            description: None,
            year: None,
            country: None,
            duration_min: None,
            quality: Quality::Hd,
            external_rating: None,
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let store = MemoryStore::new();
        store.insert_entry(draft(10, "First")).await.expect("insert");

        let err = store.insert_entry(draft(10, "Second")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCode(10)));
    }

    #[tokio::test]
    async fn test_tombstoned_code_can_be_reused() {
        let store = MemoryStore::new();
        store.insert_entry(draft(10, "First")).await.expect("insert");
        store.deactivate_entry(10).await.expect("deactivate");

        assert!(store.entry_by_code(10).await.expect("lookup").is_none());
        store.insert_entry(draft(10, "Second")).await.expect("reinsert");
        let entry = store.entry_by_code(10).await.expect("lookup").expect("entry");
        assert_eq!(entry.title, "Second");
    }

    #[tokio::test]
    async fn test_record_view_bumps_counter_and_appends_event() {
        let store = MemoryStore::new();
        store.insert_entry(draft(7, "Movie")).await.expect("insert");
        store.upsert_actor(1, None, None).await.expect("actor");

        store.record_view(1, 7).await.expect("view");
        store.record_view(1, 7).await.expect("view");

        let entry = store.entry_by_code(7).await.expect("lookup").expect("entry");
        assert_eq!(entry.views, 2);
        assert_eq!(store.actor_stats(1).await.expect("stats").views, 2);
        assert_eq!(store.global_stats().await.expect("stats").total_views, 2);
    }

    #[tokio::test]
    async fn test_rating_upsert_keeps_one_row() {
        let store = MemoryStore::new();
        store.insert_entry(draft(7, "Movie")).await.expect("insert");

        store.upsert_rating(1, 7, 5, None).await.expect("rate");
        store.upsert_rating(1, 7, 2, Some("meh")).await.expect("re-rate");

        let summary = store.rating_summary(7).await.expect("summary");
        assert_eq!(summary.count, 1);
        assert!((summary.average - 2.0).abs() < f64::EPSILON);

        let own = store.actor_rating(1, 7).await.expect("own").expect("rating");
        assert_eq!(own.score, 2);
        assert_eq!(own.review.as_deref(), Some("meh"));
    }

    #[tokio::test]
    async fn test_rating_summary_rounds_to_one_decimal() {
        let store = MemoryStore::new();
        store.insert_entry(draft(7, "Movie")).await.expect("insert");

        store.upsert_rating(1, 7, 5, None).await.expect("rate");
        store.upsert_rating(2, 7, 4, None).await.expect("rate");
        store.upsert_rating(3, 7, 4, None).await.expect("rate");

        let summary = store.rating_summary(7).await.expect("summary");
        assert_eq!(summary.count, 3);
        assert!((summary.average - 4.3).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_search_orders_by_views() {
        let store = MemoryStore::new();
        store.insert_entry(draft(1, "Alpha Quest")).await.expect("insert");
        store.insert_entry(draft(2, "Alpha Returns")).await.expect("insert");
        store.upsert_actor(9, None, None).await.expect("actor");
        store.record_view(9, 2).await.expect("view");

        let hits = store.search_entries("alpha", 10).await.expect("search");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].code, 2);
    }

    #[tokio::test]
    async fn test_channels_ordered_by_priority() {
        let store = MemoryStore::new();
        store.add_required_channel(-100, "Low", 0).await.expect("add");
        store.add_required_channel(-200, "High", 5).await.expect("add");

        let channels = store.required_channels().await.expect("list");
        assert_eq!(channels[0].channel_id, -200);

        let err = store.add_required_channel(-100, "Low again", 0).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateChannel(-100)));
    }

    #[tokio::test]
    async fn test_actor_upsert_refreshes_existing_row() {
        let store = MemoryStore::new();
        store.upsert_actor(5, Some("old"), Some("Name")).await.expect("upsert");
        store.upsert_actor(5, Some("new"), None).await.expect("upsert");

        assert_eq!(store.actor_count().await.expect("count"), 1);
        assert_eq!(store.active_actor_count(1).await.expect("active"), 1);
    }
}
