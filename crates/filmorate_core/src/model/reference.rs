//! Genre and rating reference rows.
//!
//! Both tables are seeded once by the schema bootstrap and are read-only for
//! the rest of the core.

use super::{GenreId, RatingId};
use serde::{Deserialize, Serialize};

/// MPA rating seed, identical to migration `0002_reference_seed.sql`.
pub const RATING_SEED: &[(RatingId, &str)] = &[
    (1, "G"),
    (2, "PG"),
    (3, "PG-13"),
    (4, "R"),
    (5, "NC-17"),
];

/// Genre seed, identical to migration `0002_reference_seed.sql`.
pub const GENRE_SEED: &[(GenreId, &str)] = &[
    (1, "Комедия"),
    (2, "Драма"),
    (3, "Мультфильм"),
    (4, "Триллер"),
    (5, "Документальный"),
    (6, "Боевик"),
];

/// Film genre.
///
/// Ordered by id first, so a `BTreeSet<Genre>` iterates in id order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    /// Empty when the genre is only referenced by id (write input).
    #[serde(default)]
    pub name: String,
}

impl Genre {
    pub fn new(id: GenreId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Reference by id only, as sent by callers on film writes.
    pub fn with_id(id: GenreId) -> Self {
        Self::new(id, "")
    }
}

/// MPA age rating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    #[serde(default)]
    pub name: String,
}

impl Rating {
    pub fn new(id: RatingId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn with_id(id: RatingId) -> Self {
        Self::new(id, "")
    }
}

/// Seeded ratings as model values.
pub fn seeded_ratings() -> Vec<Rating> {
    RATING_SEED
        .iter()
        .map(|(id, name)| Rating::new(*id, *name))
        .collect()
}

/// Seeded genres as model values.
pub fn seeded_genres() -> Vec<Genre> {
    GENRE_SEED
        .iter()
        .map(|(id, name)| Genre::new(*id, *name))
        .collect()
}
