//! In-memory store implementing every repository contract.
//!
//! # Responsibility
//! - Back tests and `backend = "memory"` configs without SQLite.
//! - Mirror the relational layout: scalar rows per entity plus pair sets per
//!   link table, hydrated on read.
//!
//! # Invariants
//! - All state sits behind one mutex; each call is one critical section, so
//!   `replace_all` is atomic for readers.
//! - Ids come from per-kind counters and are never reused.
//! - Reference rows are seeded from the same data as the SQLite migration.
//! - Link pairs obey the SQLite foreign keys and the self-friendship `CHECK`.

use super::film_repo::FilmRepository;
use super::reference_repo::{
    ensure_references, GenreRepository, RatingRepository, ReferenceValidator,
};
use super::relation::{RelationKind, RelationWriter};
use super::user_repo::UserRepository;
use super::{RepoError, RepoResult};
use crate::model::film::{Film, FilmPatch};
use crate::model::reference::{seeded_genres, seeded_ratings, Genre, Rating};
use crate::model::user::{User, UserPatch};
use crate::model::{EntityKind, FilmId, GenreId, RatingId, UserId};
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared in-memory store; clones share state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Scalar film rows; association sets live in `links`.
    films: BTreeMap<FilmId, Film>,
    users: BTreeMap<UserId, User>,
    genres: BTreeMap<GenreId, Genre>,
    ratings: BTreeMap<RatingId, Rating>,
    links: HashMap<RelationKind, BTreeSet<(i64, i64)>>,
    last_film_id: FilmId,
    last_user_id: UserId,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store with seeded genres and ratings.
    pub fn new() -> Self {
        let state = MemoryState {
            genres: seeded_genres()
                .into_iter()
                .map(|genre| (genre.id, genre))
                .collect(),
            ratings: seeded_ratings()
                .into_iter()
                .map(|rating| (rating.id, rating))
                .collect(),
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn pairs(&mut self, kind: RelationKind) -> &mut BTreeSet<(i64, i64)> {
        self.links.entry(kind).or_default()
    }

    fn children_of(&self, parent: i64, kind: RelationKind) -> BTreeSet<i64> {
        self.links
            .get(&kind)
            .map(|pairs| {
                pairs
                    .range((parent, i64::MIN)..=(parent, i64::MAX))
                    .map(|(_, child)| *child)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rejects the pairs SQLite's foreign keys and `CHECK` would reject.
    fn check_pair(&self, parent: i64, child: i64, kind: RelationKind) -> RepoResult<()> {
        let valid = match kind {
            RelationKind::FilmGenre => {
                self.films.contains_key(&parent) && self.genres.contains_key(&child)
            }
            RelationKind::FilmLike => {
                self.films.contains_key(&parent) && self.users.contains_key(&child)
            }
            RelationKind::Friendship => {
                parent != child
                    && self.users.contains_key(&parent)
                    && self.users.contains_key(&child)
            }
        };
        if valid {
            return Ok(());
        }
        warn!(
            "event=relation_link module=repo status=error backend=memory error_code=constraint table={} parent={parent} child={child}",
            kind.table()
        );
        Err(RepoError::Constraint {
            table: kind.table(),
            parent,
            child,
        })
    }

    fn replace_all(&mut self, parent: i64, children: &BTreeSet<i64>, kind: RelationKind) {
        let pairs = self.pairs(kind);
        pairs.retain(|(owner, _)| *owner != parent);
        pairs.extend(children.iter().map(|child| (parent, *child)));
    }

    fn hydrate_film(&self, stored: &Film) -> RepoResult<Film> {
        let mut film = stored.clone();
        film.mpa = self
            .ratings
            .get(&stored.mpa.id)
            .cloned()
            .ok_or_else(|| RepoError::Decode(format!("film {} has no rating row", stored.id)))?;
        film.genres = self
            .children_of(stored.id, RelationKind::FilmGenre)
            .into_iter()
            .map(|genre_id| {
                self.genres.get(&genre_id).cloned().ok_or_else(|| {
                    RepoError::Decode(format!("film_genre.genre_id {genre_id} has no genre row"))
                })
            })
            .collect::<RepoResult<_>>()?;
        film.likes = self.children_of(stored.id, RelationKind::FilmLike);
        Ok(film)
    }

    fn hydrate_user(&self, stored: &User) -> User {
        let mut user = stored.clone();
        user.friends = self.children_of(stored.id, RelationKind::Friendship);
        user
    }
}

impl ReferenceValidator for MemoryState {
    fn rating_exists(&self, id: RatingId) -> RepoResult<bool> {
        Ok(self.ratings.contains_key(&id))
    }

    fn genre_exists(&self, id: GenreId) -> RepoResult<bool> {
        Ok(self.genres.contains_key(&id))
    }
}

impl FilmRepository for MemoryStore {
    fn create_film(&self, film: &Film) -> RepoResult<Film> {
        film.validate()?;
        let genre_ids = film.genre_ids();

        let mut state = self.lock();
        ensure_references(&*state, film.mpa.id, genre_ids.iter().copied())?;

        state.last_film_id += 1;
        let film_id = state.last_film_id;
        let mut row = film.clone();
        row.id = film_id;
        row.genres.clear();
        row.likes.clear();
        state.films.insert(film_id, row);
        state.replace_all(film_id, &genre_ids, RelationKind::FilmGenre);

        info!(
            "event=film_create module=repo status=ok backend=memory film_id={film_id} genres={}",
            genre_ids.len()
        );
        let stored = &state.films[&film_id];
        state.hydrate_film(stored)
    }

    fn update_film(&self, patch: &FilmPatch) -> RepoResult<Film> {
        let mut state = self.lock();
        let Some(stored) = state.films.get(&patch.id) else {
            warn!(
                "event=film_update module=repo status=error backend=memory error_code=not_found film_id={}",
                patch.id
            );
            return Err(RepoError::not_found(EntityKind::Film, patch.id));
        };

        let merged = patch.apply_to(&state.hydrate_film(stored)?);
        merged.validate()?;
        if patch.touches_references() {
            ensure_references(&*state, merged.mpa.id, merged.genre_ids())?;
        }

        let mut row = merged.clone();
        row.genres.clear();
        row.likes.clear();
        state.films.insert(merged.id, row);
        if patch.genres.is_some() {
            state.replace_all(merged.id, &merged.genre_ids(), RelationKind::FilmGenre);
        }

        info!(
            "event=film_update module=repo status=ok backend=memory film_id={} genres_replaced={}",
            merged.id,
            patch.genres.is_some()
        );
        let stored = &state.films[&merged.id];
        state.hydrate_film(stored)
    }

    fn find_film(&self, id: FilmId) -> RepoResult<Option<Film>> {
        let state = self.lock();
        state
            .films
            .get(&id)
            .map(|stored| state.hydrate_film(stored))
            .transpose()
    }

    fn list_films(&self) -> RepoResult<Vec<Film>> {
        let state = self.lock();
        state
            .films
            .values()
            .map(|stored| state.hydrate_film(stored))
            .collect()
    }

    fn add_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool> {
        self.link(film_id, user_id, RelationKind::FilmLike)
    }

    fn delete_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool> {
        self.unlink(film_id, user_id, RelationKind::FilmLike)
    }
}

impl UserRepository for MemoryStore {
    fn create_user(&self, user: &User) -> RepoResult<User> {
        let user = user.clone().with_name_fallback();
        user.validate()?;

        let mut state = self.lock();
        state.last_user_id += 1;
        let user_id = state.last_user_id;
        let mut row = user;
        row.id = user_id;
        row.friends.clear();
        state.users.insert(user_id, row);

        info!("event=user_create module=repo status=ok backend=memory user_id={user_id}");
        Ok(state.hydrate_user(&state.users[&user_id]))
    }

    fn update_user(&self, patch: &UserPatch) -> RepoResult<User> {
        let mut state = self.lock();
        let Some(stored) = state.users.get(&patch.id) else {
            warn!(
                "event=user_update module=repo status=error backend=memory error_code=not_found user_id={}",
                patch.id
            );
            return Err(RepoError::not_found(EntityKind::User, patch.id));
        };

        let merged = patch.apply_to(stored);
        merged.validate()?;
        state.users.insert(merged.id, merged.clone());

        info!(
            "event=user_update module=repo status=ok backend=memory user_id={}",
            merged.id
        );
        Ok(state.hydrate_user(&merged))
    }

    fn find_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let state = self.lock();
        Ok(state.users.get(&id).map(|stored| state.hydrate_user(stored)))
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .map(|stored| state.hydrate_user(stored))
            .collect())
    }

    fn add_friend(&self, owner: UserId, target: UserId) -> RepoResult<bool> {
        self.link(owner, target, RelationKind::Friendship)
    }

    fn delete_friend(&self, owner: UserId, target: UserId) -> RepoResult<bool> {
        self.unlink(owner, target, RelationKind::Friendship)
    }

    fn friends_of(&self, owner: UserId) -> RepoResult<BTreeSet<UserId>> {
        self.children_of(owner, RelationKind::Friendship)
    }

    fn common_friends(&self, first: UserId, second: UserId) -> RepoResult<BTreeSet<UserId>> {
        let state = self.lock();
        let first_friends = state.children_of(first, RelationKind::Friendship);
        let second_friends = state.children_of(second, RelationKind::Friendship);
        Ok(first_friends
            .intersection(&second_friends)
            .copied()
            .collect())
    }
}

impl RelationWriter for MemoryStore {
    fn link(&self, parent: i64, child: i64, kind: RelationKind) -> RepoResult<bool> {
        let mut state = self.lock();
        state.check_pair(parent, child, kind)?;
        let inserted = state.pairs(kind).insert((parent, child));
        if inserted {
            info!(
                "event=relation_link module=repo status=ok backend=memory table={} parent={parent} child={child}",
                kind.table()
            );
        }
        Ok(inserted)
    }

    fn unlink(&self, parent: i64, child: i64, kind: RelationKind) -> RepoResult<bool> {
        let removed = self.lock().pairs(kind).remove(&(parent, child));
        if removed {
            info!(
                "event=relation_unlink module=repo status=ok backend=memory table={} parent={parent} child={child}",
                kind.table()
            );
        }
        Ok(removed)
    }

    fn replace_all(
        &self,
        parent: i64,
        children: &BTreeSet<i64>,
        kind: RelationKind,
    ) -> RepoResult<()> {
        let mut state = self.lock();
        for child in children {
            state.check_pair(parent, *child, kind)?;
        }
        state.replace_all(parent, children, kind);
        Ok(())
    }

    fn children_of(&self, parent: i64, kind: RelationKind) -> RepoResult<BTreeSet<i64>> {
        Ok(self.lock().children_of(parent, kind))
    }
}

impl GenreRepository for MemoryStore {
    fn list_genres(&self) -> RepoResult<Vec<Genre>> {
        Ok(self.lock().genres.values().cloned().collect())
    }

    fn find_genre(&self, id: GenreId) -> RepoResult<Option<Genre>> {
        Ok(self.lock().genres.get(&id).cloned())
    }
}

impl RatingRepository for MemoryStore {
    fn list_ratings(&self) -> RepoResult<Vec<Rating>> {
        Ok(self.lock().ratings.values().cloned().collect())
    }

    fn find_rating(&self, id: RatingId) -> RepoResult<Option<Rating>> {
        Ok(self.lock().ratings.get(&id).cloned())
    }
}

impl ReferenceValidator for MemoryStore {
    fn rating_exists(&self, id: RatingId) -> RepoResult<bool> {
        self.lock().rating_exists(id)
    }

    fn genre_exists(&self, id: GenreId) -> RepoResult<bool> {
        self.lock().genre_exists(id)
    }
}
