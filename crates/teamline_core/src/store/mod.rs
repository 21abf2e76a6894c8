//! Entity store adapter: per-entity access contracts and SQLite document
//! tables.
//!
//! # Responsibility
//! - Define use-case oriented store contracts per entity type.
//! - Keep SQL and JSON codec details inside the persistence boundary.
//!
//! # Invariants
//! - A single-row upsert is the only atomic unit; no store operation ever
//!   spans multiple documents in one transaction.
//! - Write paths call the entity's `validate()` before persisting; read
//!   paths reject undecodable persisted documents instead of masking them.
//! - `busy`/`locked` SQLite failures are classified transient so callers
//!   can retry; everything else is deterministic.

use crate::db::DbError;
use crate::model::{EntityKind, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod catalog;
pub mod projects;
pub mod tasks;
pub mod users;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error shared by all entity stores.
#[derive(Debug)]
pub enum StoreError {
    /// Field validation failed before the write was attempted.
    Validation(ValidationError),
    /// Underlying SQLite failure.
    Db(DbError),
    /// Row exists but its document cannot be decoded (or the entity cannot
    /// be encoded).
    InvalidDoc {
        table: &'static str,
        detail: String,
    },
    /// Target row absent where the operation requires it.
    NotFound { entity: EntityKind, id: Uuid },
    /// Expected document table is missing from the connection.
    MissingRequiredTable(&'static str),
}

impl StoreError {
    /// Whether retrying the same write may succeed (lock contention).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if matches!(
                    err.code,
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                )
        )
    }

    /// Whether the write lost to a store-level unique index.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == ErrorCode::ConstraintViolation
        )
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidDoc { table, detail } => {
                write!(f, "invalid document in table `{table}`: {detail}")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "store requires table `{table}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn decode_doc<T: DeserializeOwned>(
    table: &'static str,
    doc: &str,
) -> StoreResult<T> {
    serde_json::from_str(doc).map_err(|err| StoreError::InvalidDoc {
        table,
        detail: err.to_string(),
    })
}

pub(crate) fn encode_doc<T: Serialize>(table: &'static str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|err| StoreError::InvalidDoc {
        table,
        detail: err.to_string(),
    })
}

/// Loads one document by id.
pub(crate) fn load_doc<T: DeserializeOwned>(
    conn: &Connection,
    table: &'static str,
    id: Uuid,
) -> StoreResult<Option<T>> {
    let mut stmt = conn.prepare(&format!("SELECT doc FROM {table} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        let doc: String = row.get(0)?;
        return Ok(Some(decode_doc(table, &doc)?));
    }
    Ok(None)
}

/// Loads documents for an id set. Absent ids are silently skipped; callers
/// that need strict existence check the returned set themselves.
pub(crate) fn load_docs_by_ids<T: DeserializeOwned>(
    conn: &Connection,
    table: &'static str,
    ids: &BTreeSet<Uuid>,
) -> StoreResult<Vec<T>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = std::iter::repeat("?")
        .take(ids.len())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT doc FROM {table} WHERE id IN ({placeholders}) ORDER BY id ASC;");
    let bind_values: Vec<Value> = ids.iter().map(|id| Value::Text(id.to_string())).collect();

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut docs = Vec::new();
    while let Some(row) = rows.next()? {
        let doc: String = row.get(0)?;
        docs.push(decode_doc(table, &doc)?);
    }
    Ok(docs)
}

/// Upserts one document. A single row write, atomic on its own.
pub(crate) fn save_doc<T: Serialize>(
    conn: &Connection,
    table: &'static str,
    id: Uuid,
    value: &T,
) -> StoreResult<()> {
    let doc = encode_doc(table, value)?;
    conn.execute(
        &format!(
            "INSERT INTO {table} (id, doc) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET doc = excluded.doc;"
        ),
        [id.to_string(), doc],
    )?;
    Ok(())
}

/// Deletes one document row; `NotFound` when no row matched.
pub(crate) fn delete_doc(
    conn: &Connection,
    table: &'static str,
    entity: EntityKind,
    id: Uuid,
) -> StoreResult<()> {
    let changed = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id.to_string()])?;
    if changed == 0 {
        return Err(StoreError::NotFound { entity, id });
    }
    Ok(())
}

pub(crate) fn ensure_table(conn: &Connection, table: &'static str) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::MissingRequiredTable(table));
    }
    Ok(())
}
