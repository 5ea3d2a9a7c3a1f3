//! Column access helpers for join rows.

use super::aggregate::link_id;
use super::{RepoError, RepoResult};
use rusqlite::types::FromSql;
use rusqlite::Row;

/// Reads a column every row of the query must carry.
///
/// NULLs, type mismatches and unknown columns all become `RepoError::Decode`.
pub(crate) fn required<T: FromSql>(row: &Row<'_>, column: &str) -> RepoResult<T> {
    row.get(column)
        .map_err(|err| RepoError::Decode(format!("column `{column}`: {err}")))
}

/// Reads a nullable child-key column of a LEFT JOIN.
///
/// `NULL` and `0` both mean "no child on this row".
pub(crate) fn child_key(row: &Row<'_>, column: &str) -> RepoResult<Option<i64>> {
    let value: Option<i64> = required(row, column)?;
    Ok(link_id(value))
}
