//! Persistence core for the film catalogue.
//!
//! Folds join output into film/user aggregates, manages the like, friendship
//! and film-genre link tables, and validates references before writes.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{open_store, ConfigError, StoreBackend, StoreConfig, StoreHandle};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::film::{Film, FilmPatch, FilmValidationError};
pub use model::reference::{Genre, Rating};
pub use model::user::{User, UserPatch, UserValidationError};
pub use model::{EntityKind, FilmId, GenreId, RatingId, UserId};
pub use repo::aggregate::{aggregate_rows, Aggregate, FilmLink, JoinDecoder, RowAggregator};
pub use repo::film_repo::{FilmRepository, SqliteFilmRepository};
pub use repo::memory::MemoryStore;
pub use repo::reference_repo::{
    ensure_references, GenreRepository, RatingRepository, ReferenceValidator,
    SqliteReferenceRepository,
};
pub use repo::relation::{RelationKind, RelationWriter, SqliteRelationWriter};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::film_service::FilmService;
pub use service::reference_service::ReferenceService;
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
