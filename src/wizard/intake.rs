//! Content-intake wizard.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use thiserror::Error;
use tracing::{info, warn};

use super::session::SessionStore;
use super::steps::WizardStep;
use crate::catalog::{CatalogEntry, CatalogStore, FileRef, Quality, StoreError};
use crate::config::{
    BotConfig, MAX_DURATION_MIN, MAX_EXTERNAL_RATING, MAX_YEAR_AHEAD, MIN_DURATION_MIN,
    MIN_GENRE_LEN, MIN_TITLE_LEN, MIN_YEAR, SKIP_TOKEN,
};
use crate::format;
use crate::transport::{Button, ChatRef, Keyboard, Transport, TransportError};

/// Raw admin input for one wizard step.
#[derive(Debug, Clone)]
pub enum WizardInput {
    Text(String),
    Video(FileRef),
    Document(FileRef),
    Photo(FileRef),
}

/// Why a step submission was rejected. The session stays at the same step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The file step needs a video or document.
    ExpectedFile,
    /// The thumbnail step needs a photo (or the skip token).
    ExpectedPhoto,
    /// A text step received a non-text payload.
    ExpectedText,
    /// The code must be a positive integer.
    InvalidCode,
    /// An active entry already owns this code.
    DuplicateCode(i64),
    /// Title shorter than the minimum.
    TitleTooShort,
    /// Genre shorter than the minimum.
    GenreTooShort,
    /// Year outside the accepted range or not a number.
    InvalidYear,
    /// Duration outside the accepted range or not a number.
    InvalidDuration,
    /// Not one of the fixed quality tiers.
    UnknownQuality,
    /// External rating outside 0..=10 or not a number.
    InvalidRating,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedFile => write!(f, "Send a video or document file."),
            Self::ExpectedPhoto => write!(f, "Send an image, or {SKIP_TOKEN}."),
            Self::ExpectedText => write!(f, "Send plain text here."),
            Self::InvalidCode => write!(f, "The code must be a positive number, e.g. 1234."),
            Self::DuplicateCode(code) => {
                write!(f, "Code {code} is already taken. Pick another one.")
            }
            Self::TitleTooShort => {
                write!(f, "The title must be at least {MIN_TITLE_LEN} characters.")
            }
            Self::GenreTooShort => {
                write!(f, "The genre must be at least {MIN_GENRE_LEN} characters.")
            }
            Self::InvalidYear => write!(f, "Enter a year from {MIN_YEAR} onwards."),
            Self::InvalidDuration => write!(
                f,
                "Enter a runtime between {MIN_DURATION_MIN} and {MAX_DURATION_MIN} minutes."
            ),
            Self::UnknownQuality => write!(f, "Pick one of: CAM, HD, FullHD, 4K."),
            Self::InvalidRating => {
                write!(f, "Enter a rating between 0 and {MAX_EXTERNAL_RATING}.")
            }
        }
    }
}

/// Result of one step submission.
#[derive(Debug)]
pub enum StepOutcome {
    /// The field was accepted; the session moved to the given step.
    Advance(WizardStep),
    /// The field was rejected; the session stays at the same step.
    Reject(RejectReason),
    /// The final step was accepted and the entry was created.
    ///
    /// `announcement` reports whether the public-channel post went out;
    /// a failure there never rolls back the creation.
    Complete {
        entry: CatalogEntry,
        announcement: Result<(), TransportError>,
    },
}

/// Wizard failures that end the current run.
#[derive(Debug, Error)]
pub enum WizardError {
    /// `submit` without a live session.
    #[error("no wizard session is active for actor {0}")]
    NoSession(i64),

    /// The accumulated draft is missing required fields. Only reachable if
    /// session state was tampered with outside the step machine.
    #[error("wizard session is missing required fields")]
    IncompleteDraft,

    /// Storage failure while creating the entry; reported verbatim, the
    /// session is already cleared.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The admin content-intake wizard.
///
/// Drives [`SessionStore`] sessions through the fixed [`WizardStep`] order,
/// validating exactly one field per step. Completion creates one catalog
/// entry and announces it to the public channel.
pub struct IntakeWizard {
    store: Arc<dyn CatalogStore>,
    transport: Arc<dyn Transport>,
    sessions: SessionStore,
    announce_channel: String,
    bot_username: String,
}

impl IntakeWizard {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        transport: Arc<dyn Transport>,
        config: &BotConfig,
    ) -> Self {
        Self {
            store,
            transport,
            sessions: SessionStore::new(),
            announce_channel: config.announce_channel.clone(),
            bot_username: config.bot_username.clone(),
        }
    }

    /// Starts (or restarts) a wizard run for the actor.
    pub async fn start(&self, actor_id: i64) -> WizardStep {
        self.sessions.begin(actor_id).await
    }

    /// Destroys the actor's session. No side effects on the catalog.
    pub async fn cancel(&self, actor_id: i64) {
        self.sessions.clear(actor_id).await;
    }

    /// Whether the actor has a wizard run in flight.
    pub async fn is_active(&self, actor_id: i64) -> bool {
        self.sessions.is_active(actor_id).await
    }

    /// Submits raw input for the actor's current step.
    pub async fn submit(
        &self,
        actor_id: i64,
        input: WizardInput,
    ) -> Result<StepOutcome, WizardError> {
        let mut session = self
            .sessions
            .get(actor_id)
            .await
            .ok_or(WizardError::NoSession(actor_id))?;

        match session.step {
            WizardStep::File => match input {
                WizardInput::Video(file) | WizardInput::Document(file) => {
                    session.draft.file = Some(file);
                }
                _ => return Ok(StepOutcome::Reject(RejectReason::ExpectedFile)),
            },
            WizardStep::Code => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                let Some(code) = parse_code(text) else {
                    return Ok(StepOutcome::Reject(RejectReason::InvalidCode));
                };
                if self.store.entry_by_code(code).await?.is_some() {
                    return Ok(StepOutcome::Reject(RejectReason::DuplicateCode(code)));
                }
                session.draft.code = Some(code);
            }
            WizardStep::Title => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                if text.chars().count() < MIN_TITLE_LEN {
                    return Ok(StepOutcome::Reject(RejectReason::TitleTooShort));
                }
                session.draft.title = Some(text.to_owned());
            }
            WizardStep::Genre => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                if text.chars().count() < MIN_GENRE_LEN {
                    return Ok(StepOutcome::Reject(RejectReason::GenreTooShort));
                }
                session.draft.genre = Some(text.to_owned());
            }
            WizardStep::Description => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                session.draft.description = skippable_text(text);
            }
            WizardStep::Year => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                if text != SKIP_TOKEN {
                    let max_year = Utc::now().year() + MAX_YEAR_AHEAD;
                    let year: i32 = match text.parse() {
                        Ok(y) => y,
                        Err(_) => return Ok(StepOutcome::Reject(RejectReason::InvalidYear)),
                    };
                    if !(MIN_YEAR..=max_year).contains(&year) {
                        return Ok(StepOutcome::Reject(RejectReason::InvalidYear));
                    }
                    session.draft.year = Some(year);
                }
            }
            WizardStep::Country => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                session.draft.country = skippable_text(text);
            }
            WizardStep::Duration => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                if text != SKIP_TOKEN {
                    let minutes: u32 = match text.parse() {
                        Ok(m) => m,
                        Err(_) => return Ok(StepOutcome::Reject(RejectReason::InvalidDuration)),
                    };
                    if !(MIN_DURATION_MIN..=MAX_DURATION_MIN).contains(&minutes) {
                        return Ok(StepOutcome::Reject(RejectReason::InvalidDuration));
                    }
                    session.draft.duration_min = Some(minutes);
                }
            }
            WizardStep::Quality => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                let Ok(quality) = text.parse::<Quality>() else {
                    return Ok(StepOutcome::Reject(RejectReason::UnknownQuality));
                };
                session.draft.quality = Some(quality);
            }
            WizardStep::ExternalRating => {
                let text = match text_of(&input) {
                    Some(t) => t,
                    None => return Ok(StepOutcome::Reject(RejectReason::ExpectedText)),
                };
                if text != SKIP_TOKEN {
                    let rating: f32 = match text.parse() {
                        Ok(r) => r,
                        Err(_) => return Ok(StepOutcome::Reject(RejectReason::InvalidRating)),
                    };
                    if !(0.0..=MAX_EXTERNAL_RATING).contains(&rating) {
                        return Ok(StepOutcome::Reject(RejectReason::InvalidRating));
                    }
                    session.draft.external_rating = Some(rating);
                }
            }
            WizardStep::Thumbnail => match input {
                WizardInput::Photo(file) => {
                    session.draft.thumbnail = Some(file);
                }
                WizardInput::Text(ref text) if text.trim() == SKIP_TOKEN => {}
                _ => return Ok(StepOutcome::Reject(RejectReason::ExpectedPhoto)),
            },
        }

        match session.step.next() {
            Some(next) => {
                session.step = next;
                self.sessions.put(actor_id, session).await;
                Ok(StepOutcome::Advance(next))
            }
            None => self.complete(actor_id, session.draft).await,
        }
    }

    /// Creates the entry from the accumulated draft and announces it.
    ///
    /// The session is cleared before touching storage, so a failure never
    /// leaves a half-live wizard behind.
    async fn complete(
        &self,
        actor_id: i64,
        draft: super::session::EntryDraft,
    ) -> Result<StepOutcome, WizardError> {
        self.sessions.clear(actor_id).await;

        let new_entry = draft.finish().ok_or(WizardError::IncompleteDraft)?;
        let entry = self.store.insert_entry(new_entry).await?;

        info!("New entry added: {} (code {})", entry.title, entry.code);

        let announcement = self.announce(&entry).await;
        if let Err(e) = &announcement {
            warn!("Failed to announce entry {}: {}", entry.code, e);
        }

        Ok(StepOutcome::Complete {
            entry,
            announcement,
        })
    }

    /// Posts the new entry to the public channel with a deep-link button.
    async fn announce(&self, entry: &CatalogEntry) -> Result<(), TransportError> {
        let mut caption = format::entry_caption(entry, None, false);
        caption.push_str("\n\n👇 Get the movie in the bot:");

        let keyboard = Keyboard::column(vec![Button::url(
            "🎬 Get the movie",
            format::deep_link(&self.bot_username, entry.code),
        )]);
        let channel = ChatRef::Handle(self.announce_channel.clone());

        match &entry.thumbnail {
            Some(thumbnail) => {
                self.transport
                    .send_photo(&channel, thumbnail, &caption, Some(keyboard))
                    .await?;
            }
            None => {
                self.transport
                    .send_text(&channel, &caption, Some(keyboard))
                    .await?;
            }
        }
        Ok(())
    }
}

/// Extracts text from an input, trimmed.
fn text_of(input: &WizardInput) -> Option<&str> {
    match input {
        WizardInput::Text(text) => Some(text.trim()),
        _ => None,
    }
}

/// Maps the skip token to `None`, anything else to the text itself.
fn skippable_text(text: &str) -> Option<String> {
    (text != SKIP_TOKEN).then(|| text.to_owned())
}

/// Parses a positive numeric code.
fn parse_code(text: &str) -> Option<i64> {
    let code: i64 = text.parse().ok()?;
    (code > 0).then_some(code)
}
