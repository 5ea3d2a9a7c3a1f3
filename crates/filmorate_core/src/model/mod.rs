//! Entity model for the film catalogue.
//!
//! # Responsibility
//! - Define films, users and the static genre/rating reference rows.
//! - Define patch types carrying "provided vs. not provided" for updates.
//!
//! # Invariants
//! - Ids are assigned by the store and never change once assigned.
//! - Association sets never hold duplicates (set semantics by id).

use std::fmt::{Display, Formatter};

pub mod film;
pub mod reference;
pub mod user;

/// Store-assigned film id.
pub type FilmId = i64;
/// Store-assigned user id.
pub type UserId = i64;
/// Seeded genre id.
pub type GenreId = i64;
/// Seeded rating id.
pub type RatingId = i64;

/// Entity kinds addressed by not-found and dangling-reference errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Film,
    User,
    Genre,
    Rating,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Film => "film",
            Self::User => "user",
            Self::Genre => "genre",
            Self::Rating => "rating",
        };
        f.write_str(name)
    }
}

/// Returns the patch value when it counts as provided.
///
/// A string is "not provided" iff it is absent or blank after trimming.
pub(crate) fn provided_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}
