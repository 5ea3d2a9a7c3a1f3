use filmorate_core::db::migrations::latest_version;
use filmorate_core::db::{open_db, open_db_in_memory, DbError};
use filmorate_core::model::reference::{seeded_genres, seeded_ratings};
use filmorate_core::{GenreRepository, MemoryStore, RatingRepository, SqliteReferenceRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "rating",
        "genre",
        "film",
        "film_genre",
        "film_likes",
        "users",
        "user_friends",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reference_tables_are_seeded_like_the_memory_store() {
    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteReferenceRepository::new(&conn);
    let memory = MemoryStore::new();

    assert_eq!(sqlite.list_ratings().unwrap(), seeded_ratings());
    assert_eq!(sqlite.list_genres().unwrap(), seeded_genres());
    assert_eq!(memory.list_ratings().unwrap(), seeded_ratings());
    assert_eq!(memory.list_genres().unwrap(), seeded_genres());

    let pg13 = sqlite.find_rating(3).unwrap().unwrap();
    assert_eq!(pg13.name, "PG-13");
    assert!(sqlite.find_rating(999).unwrap().is_none());
    assert!(memory.find_genre(999).unwrap().is_none());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filmorate.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let ratings: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM rating;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(ratings, 5);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn friendship_table_rejects_self_links() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO users (email, login, name, birthday) VALUES ('a@b.c', 'a', 'a', '1990-01-01');",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO user_friends (owner_id, target_id) VALUES (1, 1);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
