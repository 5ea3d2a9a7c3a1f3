//! Read-only genre/rating lookups and the reference validator.
//!
//! # Responsibility
//! - Serve the seeded `genre` and `rating` tables.
//! - Confirm that ids declared by a film write exist, before the write.
//!
//! # Invariants
//! - Validation fails closed: the first missing id aborts with
//!   `RepoError::ReferenceNotFound` and nothing is persisted.

use super::{RepoError, RepoResult};
use crate::model::reference::{Genre, Rating};
use crate::model::{EntityKind, GenreId, RatingId};
use log::warn;
use rusqlite::{Connection, OptionalExtension};

/// Genre lookups.
pub trait GenreRepository {
    fn list_genres(&self) -> RepoResult<Vec<Genre>>;
    fn find_genre(&self, id: GenreId) -> RepoResult<Option<Genre>>;
}

/// Rating lookups.
pub trait RatingRepository {
    fn list_ratings(&self) -> RepoResult<Vec<Rating>>;
    fn find_rating(&self, id: RatingId) -> RepoResult<Option<Rating>>;
}

/// Existence checks for ids a film write refers to.
pub trait ReferenceValidator {
    fn rating_exists(&self, id: RatingId) -> RepoResult<bool>;
    fn genre_exists(&self, id: GenreId) -> RepoResult<bool>;
}

/// Fails with `ReferenceNotFound` for the first missing rating or genre id.
pub fn ensure_references<V>(
    validator: &V,
    rating: RatingId,
    genres: impl IntoIterator<Item = GenreId>,
) -> RepoResult<()>
where
    V: ReferenceValidator + ?Sized,
{
    if !validator.rating_exists(rating)? {
        warn!("event=reference_check module=repo status=error kind=rating id={rating}");
        return Err(RepoError::reference_not_found(EntityKind::Rating, rating));
    }
    for genre in genres {
        if !validator.genre_exists(genre)? {
            warn!("event=reference_check module=repo status=error kind=genre id={genre}");
            return Err(RepoError::reference_not_found(EntityKind::Genre, genre));
        }
    }
    Ok(())
}

/// SQLite-backed reference tables.
pub struct SqliteReferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReferenceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GenreRepository for SqliteReferenceRepository<'_> {
    fn list_genres(&self) -> RepoResult<Vec<Genre>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM genre ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut genres = Vec::new();
        while let Some(row) = rows.next()? {
            genres.push(Genre::new(row.get("id")?, row.get::<_, String>("name")?));
        }
        Ok(genres)
    }

    fn find_genre(&self, id: GenreId) -> RepoResult<Option<Genre>> {
        let genre = self
            .conn
            .query_row("SELECT id, name FROM genre WHERE id = ?1;", [id], |row| {
                Ok(Genre::new(row.get("id")?, row.get::<_, String>("name")?))
            })
            .optional()?;
        Ok(genre)
    }
}

impl RatingRepository for SqliteReferenceRepository<'_> {
    fn list_ratings(&self) -> RepoResult<Vec<Rating>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM rating ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut ratings = Vec::new();
        while let Some(row) = rows.next()? {
            ratings.push(Rating::new(row.get("id")?, row.get::<_, String>("name")?));
        }
        Ok(ratings)
    }

    fn find_rating(&self, id: RatingId) -> RepoResult<Option<Rating>> {
        let rating = self
            .conn
            .query_row("SELECT id, name FROM rating WHERE id = ?1;", [id], |row| {
                Ok(Rating::new(row.get("id")?, row.get::<_, String>("name")?))
            })
            .optional()?;
        Ok(rating)
    }
}

impl ReferenceValidator for SqliteReferenceRepository<'_> {
    fn rating_exists(&self, id: RatingId) -> RepoResult<bool> {
        row_exists(self.conn, "SELECT EXISTS(SELECT 1 FROM rating WHERE id = ?1);", id)
    }

    fn genre_exists(&self, id: GenreId) -> RepoResult<bool> {
        row_exists(self.conn, "SELECT EXISTS(SELECT 1 FROM genre WHERE id = ?1);", id)
    }
}

pub(crate) fn row_exists(conn: &Connection, sql: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(exists == 1)
}
