//! Genre and rating lookup service.
//!
//! # Responsibility
//! - Serve the read-only reference tables with typed not-found errors.

use super::{ServiceError, ServiceResult};
use crate::model::reference::{Genre, Rating};
use crate::model::{GenreId, RatingId};
use crate::repo::reference_repo::{GenreRepository, RatingRepository};

/// Reference lookups over one store serving both tables.
pub struct ReferenceService<R: GenreRepository + RatingRepository> {
    store: R,
}

impl<R: GenreRepository + RatingRepository> ReferenceService<R> {
    pub fn new(store: R) -> Self {
        Self { store }
    }

    /// All genres ordered by id.
    pub fn list_genres(&self) -> ServiceResult<Vec<Genre>> {
        Ok(self.store.list_genres()?)
    }

    pub fn get_genre(&self, id: GenreId) -> ServiceResult<Genre> {
        self.store
            .find_genre(id)?
            .ok_or(ServiceError::GenreNotFound(id))
    }

    /// All ratings ordered by id.
    pub fn list_ratings(&self) -> ServiceResult<Vec<Rating>> {
        Ok(self.store.list_ratings()?)
    }

    pub fn get_rating(&self, id: RatingId) -> ServiceResult<Rating> {
        self.store
            .find_rating(id)?
            .ok_or(ServiceError::RatingNotFound(id))
    }
}
