//! Session state store for in-progress wizard runs.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::steps::WizardStep;
use crate::catalog::{FileRef, NewEntry, Quality};

/// Field values accumulated across wizard steps.
///
/// Every field is optional while the form is in flight;
/// [`finish`](Self::finish) enforces the required set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryDraft {
    pub file: Option<FileRef>,
    pub code: Option<i64>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub country: Option<String>,
    pub duration_min: Option<u32>,
    pub quality: Option<Quality>,
    pub external_rating: Option<f32>,
    pub thumbnail: Option<FileRef>,
}

impl EntryDraft {
    /// Converts the draft into an insertable field set.
    ///
    /// Returns `None` when a required field is missing, which cannot happen
    /// for a session driven through the step machine in order. Quality falls
    /// back to the default tier.
    #[must_use]
    pub fn finish(self) -> Option<NewEntry> {
        Some(NewEntry {
            code: self.code?,
            file: self.file?,
            title: self.title?,
            genre: self.genre?,
            description: self.description,
            year: self.year,
            country: self.country,
            duration_min: self.duration_min,
            quality: self.quality.unwrap_or_default(),
            external_rating: self.external_rating,
            thumbnail: self.thumbnail,
        })
    }
}

/// One in-progress wizard run.
#[derive(Debug, Clone, Default)]
pub struct WizardSession {
    pub step: WizardStep,
    pub draft: EntryDraft,
}

/// Ephemeral per-actor session storage.
///
/// At most one live session per actor identity, by construction: starting a
/// new session overwrites the old one wholesale.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, WizardSession>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session for the actor, discarding any previous one.
    pub async fn begin(&self, actor_id: i64) -> WizardStep {
        let mut sessions = self.sessions.write().await;
        sessions.insert(actor_id, WizardSession::default());
        WizardStep::first()
    }

    /// Returns a copy of the actor's live session, if any.
    pub async fn get(&self, actor_id: i64) -> Option<WizardSession> {
        self.sessions.read().await.get(&actor_id).cloned()
    }

    /// Replaces the actor's session.
    pub async fn put(&self, actor_id: i64, session: WizardSession) {
        self.sessions.write().await.insert(actor_id, session);
    }

    /// Destroys the actor's session. A no-op when none exists.
    pub async fn clear(&self, actor_id: i64) {
        self.sessions.write().await.remove(&actor_id);
    }

    /// Whether the actor currently has a live session.
    pub async fn is_active(&self, actor_id: i64) -> bool {
        self.sessions.read().await.contains_key(&actor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_begin_overwrites_previous_session() {
        let store = SessionStore::new();
        store.begin(1).await;

        let mut session = store.get(1).await.expect("session");
        session.step = WizardStep::Year;
        session.draft.code = Some(99);
        store.put(1, session).await;

        store.begin(1).await;
        let fresh = store.get(1).await.expect("session");
        assert_eq!(fresh.step, WizardStep::File);
        assert_eq!(fresh.draft.code, None);
    }

    #[tokio::test]
    async fn test_sessions_are_per_actor() {
        let store = SessionStore::new();
        store.begin(1).await;
        assert!(store.is_active(1).await);
        assert!(!store.is_active(2).await);

        store.clear(1).await;
        assert!(!store.is_active(1).await);
    }

    #[test]
    fn test_draft_requires_mandatory_fields() {
        let draft = EntryDraft {
            code: Some(1),
            file: Some(FileRef::new("f")),
            title: Some("T".repeat(2)),
            ..EntryDraft::default()
        };
        // Genre still missing.
        assert!(draft.finish().is_none());
    }

    #[test]
    fn test_draft_defaults_quality() {
        let draft = EntryDraft {
            code: Some(1),
            file: Some(FileRef::new("f")),
            title: Some("Title".to_owned()),
            genre: Some("Drama".to_owned()),
            ..EntryDraft::default()
        };
        let entry = draft.finish().expect("complete draft");
        assert_eq!(entry.quality, Quality::Hd);
    }
}
