//! Film repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create/update/find films with their rating, genre and like sets.
//! - Hydrate films from one `film ⋈ rating ⟕ film_genre ⟕ genre ⟕ film_likes`
//!   query folded by the row aggregator.
//!
//! # Invariants
//! - Create and update check references, write the row and resync genres in
//!   one IMMEDIATE transaction; a failed check leaves no row behind.
//! - Update is merge-on-blank for scalars and full-replace for genres.
//! - Likes are only changed through `add_like`/`delete_like`.

use super::aggregate::{FilmLink, JoinDecoder, RowAggregator};
use super::reference_repo::{ensure_references, SqliteReferenceRepository};
use super::relation::{link_in, replace_all_in, unlink_in, RelationKind};
use super::row::{child_key, required};
use super::{RepoError, RepoResult};
use crate::model::film::{Film, FilmPatch};
use crate::model::reference::{Genre, Rating};
use crate::model::{EntityKind, FilmId, UserId};
use log::{info, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const FILM_JOIN_SQL: &str = "SELECT
    f.id,
    f.name,
    f.description,
    f.release_date,
    f.duration,
    f.rating_id,
    r.name AS rating_name,
    fg.genre_id,
    g.name AS genre_name,
    fl.user_id AS like_user_id
FROM film f
INNER JOIN rating r ON r.id = f.rating_id
LEFT JOIN film_genre fg ON fg.film_id = f.id
LEFT JOIN genre g ON g.id = fg.genre_id
LEFT JOIN film_likes fl ON fl.film_id = f.id";

/// Repository interface for films and their like relation.
pub trait FilmRepository {
    /// Persists a new film and returns it as stored, with its assigned id.
    ///
    /// Declared likes are ignored; likes are added individually.
    fn create_film(&self, film: &Film) -> RepoResult<Film>;
    /// Merges the patch over the stored film and returns the result as stored.
    fn update_film(&self, patch: &FilmPatch) -> RepoResult<Film>;
    fn find_film(&self, id: FilmId) -> RepoResult<Option<Film>>;
    /// All films ordered by id.
    fn list_films(&self) -> RepoResult<Vec<Film>>;
    fn add_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool>;
    fn delete_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed film repository.
///
/// Writes open their own IMMEDIATE transaction without checking for an open
/// one; do not use the repository while the caller holds a transaction on the
/// same connection.
pub struct SqliteFilmRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFilmRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl FilmRepository for SqliteFilmRepository<'_> {
    fn create_film(&self, film: &Film) -> RepoResult<Film> {
        film.validate()?;
        let genre_ids = film.genre_ids();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_references(
            &SqliteReferenceRepository::new(&tx),
            film.mpa.id,
            genre_ids.iter().copied(),
        )?;

        tx.execute(
            "INSERT INTO film (
                name,
                description,
                release_date,
                duration,
                rating_id
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                film.name.as_str(),
                film.description.as_str(),
                film.release_date,
                film.duration,
                film.mpa.id,
            ],
        )?;
        let film_id = tx.last_insert_rowid();
        replace_all_in(&tx, film_id, &genre_ids, RelationKind::FilmGenre)?;
        tx.commit()?;

        info!(
            "event=film_create module=repo status=ok film_id={film_id} genres={}",
            genre_ids.len()
        );
        self.find_film(film_id)?
            .ok_or(RepoError::WriteFailed("created film missing on read-back"))
    }

    fn update_film(&self, patch: &FilmPatch) -> RepoResult<Film> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(stored) = find_film_in(&tx, patch.id)? else {
            warn!(
                "event=film_update module=repo status=error error_code=not_found film_id={}",
                patch.id
            );
            return Err(RepoError::not_found(EntityKind::Film, patch.id));
        };

        let merged = patch.apply_to(&stored);
        merged.validate()?;
        if patch.touches_references() {
            ensure_references(
                &SqliteReferenceRepository::new(&tx),
                merged.mpa.id,
                merged.genre_ids(),
            )?;
        }

        let changed = tx.execute(
            "UPDATE film
             SET
                name = ?1,
                description = ?2,
                release_date = ?3,
                duration = ?4,
                rating_id = ?5
             WHERE id = ?6;",
            params![
                merged.name.as_str(),
                merged.description.as_str(),
                merged.release_date,
                merged.duration,
                merged.mpa.id,
                merged.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::WriteFailed("film update affected no rows"));
        }

        if patch.genres.is_some() {
            replace_all_in(&tx, merged.id, &merged.genre_ids(), RelationKind::FilmGenre)?;
        }
        tx.commit()?;

        info!(
            "event=film_update module=repo status=ok film_id={} genres_replaced={}",
            merged.id,
            patch.genres.is_some()
        );
        self.find_film(merged.id)?
            .ok_or(RepoError::WriteFailed("updated film missing on read-back"))
    }

    fn find_film(&self, id: FilmId) -> RepoResult<Option<Film>> {
        find_film_in(self.conn, id)
    }

    fn list_films(&self) -> RepoResult<Vec<Film>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FILM_JOIN_SQL}
             ORDER BY f.id ASC, fg.genre_id ASC, fl.user_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut aggregator = RowAggregator::new();
        while let Some(row) = rows.next()? {
            aggregator.fold_row(&FilmRowDecoder, row)?;
        }
        Ok(aggregator.into_vec())
    }

    fn add_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool> {
        link_in(self.conn, film_id, user_id, RelationKind::FilmLike)
    }

    fn delete_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool> {
        unlink_in(self.conn, film_id, user_id, RelationKind::FilmLike)
    }
}

fn find_film_in(conn: &Connection, id: FilmId) -> RepoResult<Option<Film>> {
    let mut stmt = conn.prepare(&format!("{FILM_JOIN_SQL} WHERE f.id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let mut aggregator = RowAggregator::new();
    while let Some(row) = rows.next()? {
        aggregator.fold_row(&FilmRowDecoder, row)?;
    }
    Ok(aggregator.into_vec().into_iter().next())
}

/// Decodes rows of `FILM_JOIN_SQL`.
struct FilmRowDecoder;

impl<'stmt> JoinDecoder<Row<'stmt>> for FilmRowDecoder {
    type Entity = Film;

    fn parent_key(&self, row: &Row<'stmt>) -> RepoResult<i64> {
        required(row, "id")
    }

    fn decode_parent(&self, row: &Row<'stmt>) -> RepoResult<Film> {
        let mpa = Rating::new(
            required(row, "rating_id")?,
            required::<String>(row, "rating_name")?,
        );
        let mut film = Film::new(
            required::<String>(row, "name")?,
            required::<String>(row, "description")?,
            required(row, "release_date")?,
            required(row, "duration")?,
            mpa,
        );
        film.id = self.parent_key(row)?;
        Ok(film)
    }

    fn decode_links(&self, row: &Row<'stmt>) -> RepoResult<Vec<FilmLink>> {
        let mut links = Vec::new();
        if let Some(genre_id) = child_key(row, "genre_id")? {
            let name: Option<String> = required(row, "genre_name")?;
            let name = name.ok_or_else(|| {
                RepoError::Decode(format!("film_genre.genre_id {genre_id} has no genre row"))
            })?;
            links.push(FilmLink::Genre(Genre::new(genre_id, name)));
        }
        if let Some(user_id) = child_key(row, "like_user_id")? {
            links.push(FilmLink::Like(user_id));
        }
        Ok(links)
    }
}
