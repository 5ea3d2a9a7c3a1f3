//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create/update/find users hydrated with their friend set.
//! - Manage the directed `user_friends(owner_id, target_id)` relation.
//!
//! # Invariants
//! - Friendship is directed: `add_friend(a, b)` never implies `b -> a`.
//! - `friends_of(x)` is the target set of rows owned by `x`.
//! - A stored user's name is never blank; it falls back to the login.

use super::aggregate::{JoinDecoder, RowAggregator};
use super::relation::{children_in, link_in, unlink_in, RelationKind};
use super::row::{child_key, required};
use super::{RepoError, RepoResult};
use crate::model::user::{User, UserPatch};
use crate::model::{EntityKind, UserId};
use log::{info, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const USER_JOIN_SQL: &str = "SELECT
    u.id,
    u.email,
    u.login,
    u.name,
    u.birthday,
    uf.target_id AS friend_id
FROM users u
LEFT JOIN user_friends uf ON uf.owner_id = u.id";

/// Repository interface for users and the friendship relation.
pub trait UserRepository {
    /// Persists a new user, applying the name-falls-back-to-login default.
    fn create_user(&self, user: &User) -> RepoResult<User>;
    fn update_user(&self, patch: &UserPatch) -> RepoResult<User>;
    fn find_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// All users ordered by id.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn add_friend(&self, owner: UserId, target: UserId) -> RepoResult<bool>;
    fn delete_friend(&self, owner: UserId, target: UserId) -> RepoResult<bool>;
    fn friends_of(&self, owner: UserId) -> RepoResult<BTreeSet<UserId>>;
    /// Targets shared by both owners' friend sets.
    fn common_friends(&self, first: UserId, second: UserId) -> RepoResult<BTreeSet<UserId>>;
}

/// SQLite-backed user repository.
///
/// Writes open their own IMMEDIATE transaction without checking for an open
/// one; do not use the repository while the caller holds a transaction on the
/// same connection.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<User> {
        let user = user.clone().with_name_fallback();
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (email, login, name, birthday) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.email.as_str(),
                user.login.as_str(),
                user.name.as_str(),
                user.birthday,
            ],
        )?;
        let user_id = self.conn.last_insert_rowid();

        info!("event=user_create module=repo status=ok user_id={user_id}");
        self.find_user(user_id)?
            .ok_or(RepoError::WriteFailed("created user missing on read-back"))
    }

    fn update_user(&self, patch: &UserPatch) -> RepoResult<User> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(stored) = find_user_in(&tx, patch.id)? else {
            warn!(
                "event=user_update module=repo status=error error_code=not_found user_id={}",
                patch.id
            );
            return Err(RepoError::not_found(EntityKind::User, patch.id));
        };

        let merged = patch.apply_to(&stored);
        merged.validate()?;

        let changed = tx.execute(
            "UPDATE users
             SET
                email = ?1,
                login = ?2,
                name = ?3,
                birthday = ?4
             WHERE id = ?5;",
            params![
                merged.email.as_str(),
                merged.login.as_str(),
                merged.name.as_str(),
                merged.birthday,
                merged.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::WriteFailed("user update affected no rows"));
        }
        tx.commit()?;

        info!("event=user_update module=repo status=ok user_id={}", merged.id);
        self.find_user(merged.id)?
            .ok_or(RepoError::WriteFailed("updated user missing on read-back"))
    }

    fn find_user(&self, id: UserId) -> RepoResult<Option<User>> {
        find_user_in(self.conn, id)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_JOIN_SQL}
             ORDER BY u.id ASC, uf.target_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut aggregator = RowAggregator::new();
        while let Some(row) = rows.next()? {
            aggregator.fold_row(&UserRowDecoder, row)?;
        }
        Ok(aggregator.into_vec())
    }

    fn add_friend(&self, owner: UserId, target: UserId) -> RepoResult<bool> {
        link_in(self.conn, owner, target, RelationKind::Friendship)
    }

    fn delete_friend(&self, owner: UserId, target: UserId) -> RepoResult<bool> {
        unlink_in(self.conn, owner, target, RelationKind::Friendship)
    }

    fn friends_of(&self, owner: UserId) -> RepoResult<BTreeSet<UserId>> {
        children_in(self.conn, owner, RelationKind::Friendship)
    }

    fn common_friends(&self, first: UserId, second: UserId) -> RepoResult<BTreeSet<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.target_id
             FROM user_friends a
             INNER JOIN user_friends b ON b.target_id = a.target_id
             WHERE a.owner_id = ?1
               AND b.owner_id = ?2
             ORDER BY a.target_id ASC;",
        )?;
        let mut rows = stmt.query(params![first, second])?;
        let mut common = BTreeSet::new();
        while let Some(row) = rows.next()? {
            common.insert(row.get(0)?);
        }
        Ok(common)
    }
}

fn find_user_in(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_JOIN_SQL} WHERE u.id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let mut aggregator = RowAggregator::new();
    while let Some(row) = rows.next()? {
        aggregator.fold_row(&UserRowDecoder, row)?;
    }
    Ok(aggregator.into_vec().into_iter().next())
}

/// Decodes rows of `USER_JOIN_SQL`.
struct UserRowDecoder;

impl<'stmt> JoinDecoder<Row<'stmt>> for UserRowDecoder {
    type Entity = User;

    fn parent_key(&self, row: &Row<'stmt>) -> RepoResult<i64> {
        required(row, "id")
    }

    fn decode_parent(&self, row: &Row<'stmt>) -> RepoResult<User> {
        let mut user = User::new(
            required::<String>(row, "email")?,
            required::<String>(row, "login")?,
            required::<String>(row, "name")?,
            required(row, "birthday")?,
        );
        user.id = self.parent_key(row)?;
        Ok(user)
    }

    fn decode_links(&self, row: &Row<'stmt>) -> RepoResult<Vec<UserId>> {
        Ok(child_key(row, "friend_id")?.into_iter().collect())
    }
}
