#![allow(dead_code)]

use chrono::NaiveDate;
use filmorate_core::db::open_db_in_memory;
use filmorate_core::{
    Film, FilmRepository, MemoryStore, Rating, RelationWriter, SqliteFilmRepository,
    SqliteRelationWriter, SqliteUserRepository, User, UserRepository,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn film(name: &str, rating: i64, genres: &[i64]) -> Film {
    Film::new(
        name,
        format!("{name} description"),
        date(1999, 3, 31),
        136,
        Rating::with_id(rating),
    )
    .with_genre_ids(genres.iter().copied())
}

pub fn user(login: &str) -> User {
    User::new(
        format!("{login}@example.com"),
        login,
        format!("{login} name"),
        date(1990, 1, 1),
    )
}

/// Runs `check` against a fresh SQLite database and a fresh memory store.
pub fn with_backends(check: impl Fn(&dyn FilmRepository, &dyn UserRepository)) {
    let conn = open_db_in_memory().unwrap();
    check(
        &SqliteFilmRepository::new(&conn),
        &SqliteUserRepository::new(&conn),
    );

    let store = MemoryStore::new();
    check(&store, &store);
}

/// Like `with_backends`, with the backend's relation writer as well.
pub fn with_relation_backends(
    check: impl Fn(&dyn FilmRepository, &dyn UserRepository, &dyn RelationWriter),
) {
    let conn = open_db_in_memory().unwrap();
    check(
        &SqliteFilmRepository::new(&conn),
        &SqliteUserRepository::new(&conn),
        &SqliteRelationWriter::new(&conn),
    );

    let store = MemoryStore::new();
    check(&store, &store, &store);
}
