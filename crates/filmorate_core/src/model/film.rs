//! Film domain model.
//!
//! # Responsibility
//! - Define the hydrated film aggregate (scalars + rating + genre/like sets).
//! - Define `FilmPatch`, the update input with explicit "not provided" fields.
//! - Validate film invariants before any write.
//!
//! # Invariants
//! - `id` is `0` until the store assigns one, and stable afterwards.
//! - `genres` holds at most one entry per genre id.
//! - `release_date` is never earlier than 1895-12-28.

use super::reference::{Genre, Rating};
use super::{provided_text, FilmId, GenreId, UserId};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum description length, counted in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// First public film screening; no release may predate it.
pub static MIN_RELEASE_DATE: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1895, 12, 28).expect("valid calendar date"));

/// Film invariant violations detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilmValidationError {
    BlankName,
    DescriptionTooLong { chars: usize },
    ReleaseDateTooEarly(NaiveDate),
    NonPositiveDuration(i32),
}

impl Display for FilmValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "film name must not be blank"),
            Self::DescriptionTooLong { chars } => write!(
                f,
                "film description has {chars} chars; at most {MAX_DESCRIPTION_CHARS} allowed"
            ),
            Self::ReleaseDateTooEarly(date) => write!(
                f,
                "release date {date} is earlier than {}",
                *MIN_RELEASE_DATE
            ),
            Self::NonPositiveDuration(minutes) => {
                write!(f, "film duration must be positive, got {minutes}")
            }
        }
    }
}

impl Error for FilmValidationError {}

/// Hydrated film aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(default)]
    pub id: FilmId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: NaiveDate,
    /// Minutes.
    pub duration: i32,
    pub mpa: Rating,
    #[serde(default)]
    pub genres: BTreeSet<Genre>,
    #[serde(default, rename = "userLikes")]
    pub likes: BTreeSet<UserId>,
}

impl Film {
    /// Creates an unsaved film with empty genre and like sets.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        release_date: NaiveDate,
        duration: i32,
        mpa: Rating,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            release_date,
            duration,
            mpa,
            genres: BTreeSet::new(),
            likes: BTreeSet::new(),
        }
    }

    /// Replaces the declared genres with id-only references.
    pub fn with_genre_ids(mut self, ids: impl IntoIterator<Item = GenreId>) -> Self {
        self.genres = ids.into_iter().map(Genre::with_id).collect();
        self
    }

    /// Distinct genre ids, regardless of the names carried by the input.
    pub fn genre_ids(&self) -> BTreeSet<GenreId> {
        self.genres.iter().map(|genre| genre.id).collect()
    }

    /// Checks scalar invariants.
    pub fn validate(&self) -> Result<(), FilmValidationError> {
        if self.name.trim().is_empty() {
            return Err(FilmValidationError::BlankName);
        }
        let chars = self.description.chars().count();
        if chars > MAX_DESCRIPTION_CHARS {
            return Err(FilmValidationError::DescriptionTooLong { chars });
        }
        if self.release_date < *MIN_RELEASE_DATE {
            return Err(FilmValidationError::ReleaseDateTooEarly(self.release_date));
        }
        if self.duration <= 0 {
            return Err(FilmValidationError::NonPositiveDuration(self.duration));
        }
        Ok(())
    }
}

/// Partial film update.
///
/// `None` (or a blank string) keeps the stored value. A provided `genres` set
/// replaces the stored genre links entirely, an empty set included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilmPatch {
    pub id: FilmId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration: Option<i32>,
    pub mpa: Option<Rating>,
    pub genres: Option<BTreeSet<Genre>>,
}

impl FilmPatch {
    pub fn new(id: FilmId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Whether the patch touches columns guarded by the reference check.
    pub fn touches_references(&self) -> bool {
        self.mpa.is_some() || self.genres.is_some()
    }

    /// Merges the patch over a stored film.
    ///
    /// Likes are never touched by an update.
    pub fn apply_to(&self, stored: &Film) -> Film {
        let mut merged = stored.clone();
        if let Some(name) = provided_text(&self.name) {
            merged.name = name.to_string();
        }
        if let Some(description) = provided_text(&self.description) {
            merged.description = description.to_string();
        }
        if let Some(release_date) = self.release_date {
            merged.release_date = release_date;
        }
        if let Some(duration) = self.duration {
            merged.duration = duration;
        }
        if let Some(mpa) = &self.mpa {
            merged.mpa = mpa.clone();
        }
        if let Some(genres) = &self.genres {
            merged.genres = genres.clone();
        }
        merged
    }
}
