//! Many-to-many link tables: film genres, film likes, user friendships.
//!
//! # Responsibility
//! - Idempotent link/unlink of `(parent, child)` pairs.
//! - Full-replace resync of one parent's link set.
//!
//! # Invariants
//! - Every link table is keyed on the pair; `link` ignores only a duplicate
//!   pair. Dangling ids and self-friendship fail with `RepoError::Constraint`
//!   on every backend.
//! - `unlink` of an absent pair reports `false`, never an error.
//! - SQLite `replace_all` runs delete + reinsert in one IMMEDIATE transaction,
//!   so readers never see the intermediate empty set.

use super::{RepoError, RepoResult};
use log::{debug, info, warn};
use rusqlite::{params, Connection, ErrorCode, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

/// Association kinds backed by a pair-keyed link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    /// `film_genre(film_id, genre_id)`
    FilmGenre,
    /// `film_likes(film_id, user_id)`
    FilmLike,
    /// `user_friends(owner_id, target_id)`, directed.
    Friendship,
}

impl RelationKind {
    pub fn table(self) -> &'static str {
        match self {
            Self::FilmGenre => "film_genre",
            Self::FilmLike => "film_likes",
            Self::Friendship => "user_friends",
        }
    }

    /// Absorbs only the pair-key conflict; `CHECK` and foreign-key failures
    /// still surface.
    fn insert_sql(self) -> &'static str {
        match self {
            Self::FilmGenre => {
                "INSERT INTO film_genre (film_id, genre_id) VALUES (?1, ?2)
                 ON CONFLICT (film_id, genre_id) DO NOTHING;"
            }
            Self::FilmLike => {
                "INSERT INTO film_likes (film_id, user_id) VALUES (?1, ?2)
                 ON CONFLICT (film_id, user_id) DO NOTHING;"
            }
            Self::Friendship => {
                "INSERT INTO user_friends (owner_id, target_id) VALUES (?1, ?2)
                 ON CONFLICT (owner_id, target_id) DO NOTHING;"
            }
        }
    }

    fn delete_pair_sql(self) -> &'static str {
        match self {
            Self::FilmGenre => "DELETE FROM film_genre WHERE film_id = ?1 AND genre_id = ?2;",
            Self::FilmLike => "DELETE FROM film_likes WHERE film_id = ?1 AND user_id = ?2;",
            Self::Friendship => "DELETE FROM user_friends WHERE owner_id = ?1 AND target_id = ?2;",
        }
    }

    fn delete_parent_sql(self) -> &'static str {
        match self {
            Self::FilmGenre => "DELETE FROM film_genre WHERE film_id = ?1;",
            Self::FilmLike => "DELETE FROM film_likes WHERE film_id = ?1;",
            Self::Friendship => "DELETE FROM user_friends WHERE owner_id = ?1;",
        }
    }

    fn select_children_sql(self) -> &'static str {
        match self {
            Self::FilmGenre => "SELECT genre_id FROM film_genre WHERE film_id = ?1 ORDER BY genre_id;",
            Self::FilmLike => "SELECT user_id FROM film_likes WHERE film_id = ?1 ORDER BY user_id;",
            Self::Friendship => {
                "SELECT target_id FROM user_friends WHERE owner_id = ?1 ORDER BY target_id;"
            }
        }
    }
}

/// Link-table writer contract.
pub trait RelationWriter {
    /// Inserts the pair if absent. Returns whether a row was inserted.
    ///
    /// Fails with `RepoError::Constraint` when either id is dangling or, for
    /// friendships, when `parent == child`.
    fn link(&self, parent: i64, child: i64, kind: RelationKind) -> RepoResult<bool>;
    /// Removes the pair if present. Returns whether a row was removed.
    fn unlink(&self, parent: i64, child: i64, kind: RelationKind) -> RepoResult<bool>;
    /// Replaces every pair of `parent` with exactly `children`.
    ///
    /// A rejected child leaves the previous set in place.
    fn replace_all(
        &self,
        parent: i64,
        children: &BTreeSet<i64>,
        kind: RelationKind,
    ) -> RepoResult<()>;
    /// Current children of `parent`, ascending.
    fn children_of(&self, parent: i64, kind: RelationKind) -> RepoResult<BTreeSet<i64>>;
}

/// SQLite-backed link-table writer.
///
/// `replace_all` opens its own transaction without checking for an open one;
/// do not call it while the caller holds a transaction on the same connection.
pub struct SqliteRelationWriter<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationWriter<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RelationWriter for SqliteRelationWriter<'_> {
    fn link(&self, parent: i64, child: i64, kind: RelationKind) -> RepoResult<bool> {
        link_in(self.conn, parent, child, kind)
    }

    fn unlink(&self, parent: i64, child: i64, kind: RelationKind) -> RepoResult<bool> {
        unlink_in(self.conn, parent, child, kind)
    }

    fn replace_all(
        &self,
        parent: i64,
        children: &BTreeSet<i64>,
        kind: RelationKind,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        replace_all_in(&tx, parent, children, kind)?;
        tx.commit()?;
        Ok(())
    }

    fn children_of(&self, parent: i64, kind: RelationKind) -> RepoResult<BTreeSet<i64>> {
        children_in(self.conn, parent, kind)
    }
}

/// `link` on an arbitrary connection or open transaction.
pub(crate) fn link_in(
    conn: &Connection,
    parent: i64,
    child: i64,
    kind: RelationKind,
) -> RepoResult<bool> {
    let inserted = conn
        .execute(kind.insert_sql(), params![parent, child])
        .map_err(|err| constraint_error(err, kind, parent, child))?;
    if inserted > 0 {
        info!(
            "event=relation_link module=repo status=ok table={} parent={parent} child={child}",
            kind.table()
        );
    } else {
        debug!(
            "event=relation_link module=repo status=noop table={} parent={parent} child={child}",
            kind.table()
        );
    }
    Ok(inserted > 0)
}

pub(crate) fn unlink_in(
    conn: &Connection,
    parent: i64,
    child: i64,
    kind: RelationKind,
) -> RepoResult<bool> {
    let removed = conn.execute(kind.delete_pair_sql(), params![parent, child])?;
    if removed > 0 {
        info!(
            "event=relation_unlink module=repo status=ok table={} parent={parent} child={child}",
            kind.table()
        );
    }
    Ok(removed > 0)
}

/// Delete-then-reinsert of one parent's pairs.
///
/// Callers own atomicity: run this inside a transaction.
pub(crate) fn replace_all_in(
    conn: &Connection,
    parent: i64,
    children: &BTreeSet<i64>,
    kind: RelationKind,
) -> RepoResult<()> {
    let removed = conn.execute(kind.delete_parent_sql(), [parent])?;
    let mut insert = conn.prepare_cached(kind.insert_sql())?;
    for child in children {
        insert
            .execute(params![parent, *child])
            .map_err(|err| constraint_error(err, kind, parent, *child))?;
    }
    info!(
        "event=relation_replace module=repo status=ok table={} parent={parent} removed={removed} linked={}",
        kind.table(),
        children.len()
    );
    Ok(())
}

pub(crate) fn children_in(
    conn: &Connection,
    parent: i64,
    kind: RelationKind,
) -> RepoResult<BTreeSet<i64>> {
    let mut stmt = conn.prepare_cached(kind.select_children_sql())?;
    let mut rows = stmt.query([parent])?;
    let mut children = BTreeSet::new();
    while let Some(row) = rows.next()? {
        children.insert(row.get(0)?);
    }
    Ok(children)
}

/// Maps SQLite constraint failures on a link insert to `RepoError::Constraint`.
fn constraint_error(
    err: rusqlite::Error,
    kind: RelationKind,
    parent: i64,
    child: i64,
) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            warn!(
                "event=relation_link module=repo status=error error_code=constraint table={} parent={parent} child={child}",
                kind.table()
            );
            return RepoError::Constraint {
                table: kind.table(),
                parent,
                child,
            };
        }
    }
    err.into()
}
