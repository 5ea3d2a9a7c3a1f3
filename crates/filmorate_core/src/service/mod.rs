//! Use-case services over the repository contracts.
//!
//! # Responsibility
//! - Check that both sides of a like/friendship exist before linking.
//! - Turn lookup misses into typed not-found errors for callers.
//! - Derive read models (friends lists, popular films) from hydrated entities.
//!
//! # Invariants
//! - Services stay storage-agnostic; SQLite and memory stores are interchangeable.

use crate::model::{EntityKind, FilmId, GenreId, RatingId, UserId};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod film_service;
pub mod reference_service;
pub mod user_service;

/// Service error for film and user use-cases.
#[derive(Debug)]
pub enum ServiceError {
    FilmNotFound(FilmId),
    UserNotFound(UserId),
    GenreNotFound(GenreId),
    RatingNotFound(RatingId),
    /// Declared rating/genre does not exist.
    InvalidReference { entity: EntityKind, id: i64 },
    /// A user tried to befriend themselves.
    SelfFriendship(UserId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FilmNotFound(id) => write!(f, "film not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::GenreNotFound(id) => write!(f, "genre not found: {id}"),
            Self::RatingNotFound(id) => write!(f, "rating not found: {id}"),
            Self::InvalidReference { entity, id } => {
                write!(f, "referenced {entity} does not exist: {id}")
            }
            Self::SelfFriendship(id) => write!(f, "user {id} cannot befriend themselves"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: EntityKind::Film,
                id,
            } => Self::FilmNotFound(id),
            RepoError::NotFound {
                entity: EntityKind::User,
                id,
            } => Self::UserNotFound(id),
            RepoError::NotFound {
                entity: EntityKind::Genre,
                id,
            } => Self::GenreNotFound(id),
            RepoError::NotFound {
                entity: EntityKind::Rating,
                id,
            } => Self::RatingNotFound(id),
            RepoError::ReferenceNotFound { entity, id } => Self::InvalidReference { entity, id },
            other => Self::Repo(other),
        }
    }
}
