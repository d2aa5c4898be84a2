//! Catalog entities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque reference to a file held by the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef(pub String);

impl FileRef {
    /// Creates a file reference from a transport-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quality tier of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    /// Camera rip.
    Cam,
    /// 720p.
    #[default]
    Hd,
    /// 1080p.
    FullHd,
    /// 2160p.
    UltraHd,
}

impl Quality {
    /// All tiers in ascending order, for keyboard rendering.
    pub const ALL: [Self; 4] = [Self::Cam, Self::Hd, Self::FullHd, Self::UltraHd];

    /// Returns the display label used in captions and buttons.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cam => "CAM",
            Self::Hd => "HD",
            Self::FullHd => "FullHD",
            Self::UltraHd => "4K",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cam" => Ok(Self::Cam),
            "hd" => Ok(Self::Hd),
            "fullhd" | "full_hd" | "1080p" => Ok(Self::FullHd),
            "4k" | "uhd" | "2160p" => Ok(Self::UltraHd),
            _ => Err(()),
        }
    }
}

/// One indexed video item, addressed by a unique numeric code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: i64,
    pub file: FileRef,
    pub title: String,
    pub genre: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub country: Option<String>,
    /// Runtime in minutes.
    pub duration_min: Option<u32>,
    pub quality: Quality,
    /// External (IMDb-style) rating on a 0..=10 scale.
    pub external_rating: Option<f32>,
    pub thumbnail: Option<FileRef>,
    /// Monotonically non-decreasing view counter.
    pub views: u64,
    /// Soft-delete tombstone flag.
    pub is_active: bool,
    pub added_at: DateTime<Utc>,
}

/// Field set for a new catalog entry, as accumulated by the intake wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub code: i64,
    pub file: FileRef,
    pub title: String,
    pub genre: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub country: Option<String>,
    pub duration_min: Option<u32>,
    pub quality: Quality,
    pub external_rating: Option<f32>,
    pub thumbnail: Option<FileRef>,
}

impl NewEntry {
    /// Materializes the entry with fresh bookkeeping fields.
    #[must_use]
    pub fn into_entry(self, added_at: DateTime<Utc>) -> CatalogEntry {
        CatalogEntry {
            code: self.code,
            file: self.file,
            title: self.title,
            genre: self.genre,
            description: self.description,
            year: self.year,
            country: self.country,
            duration_min: self.duration_min,
            quality: self.quality,
            external_rating: self.external_rating,
            thumbnail: self.thumbnail,
            views: 0,
            is_active: true,
            added_at,
        }
    }
}

/// Any user interacting with the bot, including the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// BCP-47-ish locale tag; the original deployment defaults to Uzbek.
    pub language: String,
    pub joined_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// A channel an actor must join before receiving content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredChannel {
    pub channel_id: i64,
    pub title: String,
    /// Channels are checked and rendered in descending priority order.
    pub priority: i32,
    pub is_active: bool,
}

/// Append-only record of an actor consuming an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEvent {
    pub actor_id: i64,
    pub code: i64,
    pub viewed_at: DateTime<Utc>,
}

/// An actor's 1..=5 score for an entry. At most one per (actor, code) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub actor_id: i64,
    pub code: i64,
    pub score: u8,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean score rounded to one decimal place; 0.0 when unrated.
    pub average: f64,
    pub count: u64,
}

impl RatingSummary {
    /// Whether anyone has rated the entry yet.
    #[must_use]
    pub fn is_rated(&self) -> bool {
        self.count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_parse() {
        assert_eq!("HD".parse::<Quality>(), Ok(Quality::Hd));
        assert_eq!("fullhd".parse::<Quality>(), Ok(Quality::FullHd));
        assert_eq!("4K".parse::<Quality>(), Ok(Quality::UltraHd));
        assert_eq!("cam".parse::<Quality>(), Ok(Quality::Cam));
        assert!("8k".parse::<Quality>().is_err());
    }

    #[test]
    fn test_quality_labels_round_trip() {
        for q in Quality::ALL {
            assert_eq!(q.label().parse::<Quality>(), Ok(q));
        }
    }

    #[test]
    fn test_default_quality_is_hd() {
        assert_eq!(Quality::default(), Quality::Hd);
    }

    #[test]
    fn test_new_entry_materialization() {
        let draft = NewEntry {
            code: 1234,
            file: FileRef::new("file-1"),
            title: "Avatar 2".to_owned(),
            genre: "Sci-Fi".to_owned(),
            description: None,
            year: None,
            country: None,
            duration_min: None,
            quality: Quality::Hd,
            external_rating: None,
            thumbnail: None,
        };

        let entry = draft.into_entry(Utc::now());
        assert_eq!(entry.code, 1234);
        assert_eq!(entry.views, 0);
        assert!(entry.is_active);
    }
}
