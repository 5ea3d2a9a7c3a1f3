//! Repository layer contracts and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity store contracts (films, users, genres, ratings).
//! - Fold join output into entities and manage link tables.
//! - Provide SQLite and in-memory implementations of every contract.
//!
//! # Invariants
//! - Writes validate entities and references before touching any row.
//! - Lookup misses are `Ok(None)`, never errors.
//! - Unlinking an absent pair is `Ok(false)`, never an error.

use crate::db::DbError;
use crate::model::film::FilmValidationError;
use crate::model::user::UserValidationError;
use crate::model::EntityKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod aggregate;
pub mod film_repo;
pub mod memory;
pub mod reference_repo;
pub mod relation;
mod row;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every store implementation.
#[derive(Debug)]
pub enum RepoError {
    /// Entity addressed by id does not exist.
    NotFound { entity: EntityKind, id: i64 },
    /// A write declared a rating or genre id that is not in the reference table.
    ReferenceNotFound { entity: EntityKind, id: i64 },
    InvalidFilm(FilmValidationError),
    InvalidUser(UserValidationError),
    /// The store affected no row where exactly one was expected.
    WriteFailed(&'static str),
    /// A link-table pair broke a key, foreign-key or `CHECK` constraint.
    Constraint {
        table: &'static str,
        parent: i64,
        child: i64,
    },
    /// A result row was structurally invalid.
    Decode(String),
    Db(DbError),
}

impl RepoError {
    pub fn not_found(entity: EntityKind, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn reference_not_found(entity: EntityKind, id: i64) -> Self {
        Self::ReferenceNotFound { entity, id }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ReferenceNotFound { entity, id } => {
                write!(f, "referenced {entity} does not exist: {id}")
            }
            Self::InvalidFilm(err) => write!(f, "{err}"),
            Self::InvalidUser(err) => write!(f, "{err}"),
            Self::WriteFailed(details) => write!(f, "write failed: {details}"),
            Self::Constraint {
                table,
                parent,
                child,
            } => write!(f, "pair ({parent}, {child}) rejected by `{table}` constraints"),
            Self::Decode(message) => write!(f, "invalid row: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFilm(err) => Some(err),
            Self::InvalidUser(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FilmValidationError> for RepoError {
    fn from(value: FilmValidationError) -> Self {
        Self::InvalidFilm(value)
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUser(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
