mod common;

use common::{date, film};
use filmorate_core::{Film, FilmPatch, Genre, Rating, User, UserPatch};
use serde_json::json;
use std::collections::BTreeSet;

#[test]
fn film_serializes_with_camel_case_and_user_likes() {
    let mut saved = film("Heat", 4, &[2]);
    saved.id = 3;
    saved.mpa = Rating::new(4, "R");
    saved.genres = BTreeSet::from([Genre::new(2, "Драма")]);
    saved.likes = BTreeSet::from([8, 5]);

    let value = serde_json::to_value(&saved).unwrap();
    assert_eq!(value["releaseDate"], json!("1999-03-31"));
    assert_eq!(value["mpa"], json!({ "id": 4, "name": "R" }));
    assert_eq!(value["genres"], json!([{ "id": 2, "name": "Драма" }]));
    assert_eq!(value["userLikes"], json!([5, 8]));
    assert!(value.get("likes").is_none());
}

#[test]
fn film_input_accepts_id_only_references() {
    let input: Film = serde_json::from_value(json!({
        "name": "Alien",
        "description": "In space",
        "releaseDate": "1979-05-25",
        "duration": 117,
        "mpa": { "id": 4 },
        "genres": [{ "id": 4 }, { "id": 4 }, { "id": 2 }]
    }))
    .unwrap();

    assert_eq!(input.id, 0);
    assert_eq!(input.release_date, date(1979, 5, 25));
    assert_eq!(input.mpa, Rating::with_id(4));
    assert_eq!(input.genre_ids(), BTreeSet::from([2, 4]));
    assert!(input.likes.is_empty());
}

#[test]
fn film_patch_distinguishes_absent_and_empty_genres() {
    let absent: FilmPatch = serde_json::from_value(json!({ "id": 1, "name": "" })).unwrap();
    assert_eq!(absent.id, 1);
    assert_eq!(absent.name.as_deref(), Some(""));
    assert!(absent.genres.is_none());
    assert!(!absent.touches_references());

    let cleared: FilmPatch = serde_json::from_value(json!({ "id": 1, "genres": [] })).unwrap();
    assert_eq!(cleared.genres, Some(BTreeSet::new()));
    assert!(cleared.touches_references());
}

#[test]
fn user_and_patch_deserialize_with_defaults() {
    let input: User = serde_json::from_value(json!({
        "email": "neo@example.com",
        "login": "neo",
        "birthday": "1971-09-13"
    }))
    .unwrap();
    assert_eq!(input.name, "");
    assert_eq!(input.with_name_fallback().name, "neo");

    let patch: UserPatch =
        serde_json::from_value(json!({ "id": 2, "name": "Bob" })).unwrap();
    assert_eq!(patch.id, 2);
    assert_eq!(patch.name.as_deref(), Some("Bob"));
    assert!(patch.email.is_none() && patch.birthday.is_none());
}
