//! Film use-case service.
//!
//! # Responsibility
//! - Film create/update/get/list with typed not-found errors.
//! - Like add/remove after confirming both film and user exist.
//! - Popular-films ranking by like count.

use super::{ServiceError, ServiceResult};
use crate::model::film::{Film, FilmPatch};
use crate::model::{FilmId, UserId};
use crate::repo::film_repo::FilmRepository;
use crate::repo::user_repo::UserRepository;
use log::info;
use std::cmp::Reverse;

/// Default size of the popular-films list.
pub const DEFAULT_POPULAR_COUNT: usize = 10;

/// Film service facade over film and user repositories.
pub struct FilmService<F: FilmRepository, U: UserRepository> {
    films: F,
    users: U,
}

impl<F: FilmRepository, U: UserRepository> FilmService<F, U> {
    pub fn new(films: F, users: U) -> Self {
        Self { films, users }
    }

    pub fn create_film(&self, film: &Film) -> ServiceResult<Film> {
        Ok(self.films.create_film(film)?)
    }

    pub fn update_film(&self, patch: &FilmPatch) -> ServiceResult<Film> {
        Ok(self.films.update_film(patch)?)
    }

    pub fn get_film(&self, id: FilmId) -> ServiceResult<Film> {
        self.films
            .find_film(id)?
            .ok_or(ServiceError::FilmNotFound(id))
    }

    pub fn list_films(&self) -> ServiceResult<Vec<Film>> {
        Ok(self.films.list_films()?)
    }

    /// Records a like; repeating it is a no-op.
    pub fn add_like(&self, film_id: FilmId, user_id: UserId) -> ServiceResult<()> {
        self.ensure_film_and_user(film_id, user_id)?;
        if self.films.add_like(film_id, user_id)? {
            info!("event=like_add module=service status=ok film_id={film_id} user_id={user_id}");
        }
        Ok(())
    }

    /// Removes a like. Returns whether one existed.
    pub fn delete_like(&self, film_id: FilmId, user_id: UserId) -> ServiceResult<bool> {
        self.ensure_film_and_user(film_id, user_id)?;
        let removed = self.films.delete_like(film_id, user_id)?;
        if removed {
            info!(
                "event=like_delete module=service status=ok film_id={film_id} user_id={user_id}"
            );
        }
        Ok(removed)
    }

    /// Films sorted by like count, most liked first; ties by ascending id.
    ///
    /// `None` falls back to `DEFAULT_POPULAR_COUNT`.
    pub fn top_popular(&self, count: Option<usize>) -> ServiceResult<Vec<Film>> {
        let mut films = self.films.list_films()?;
        films.sort_by_key(|film| (Reverse(film.likes.len()), film.id));
        films.truncate(count.unwrap_or(DEFAULT_POPULAR_COUNT));
        Ok(films)
    }

    fn ensure_film_and_user(&self, film_id: FilmId, user_id: UserId) -> ServiceResult<()> {
        if self.films.find_film(film_id)?.is_none() {
            return Err(ServiceError::FilmNotFound(film_id));
        }
        if self.users.find_user(user_id)?.is_none() {
            return Err(ServiceError::UserNotFound(user_id));
        }
        Ok(())
    }
}
