//! Label and status store contracts and SQLite implementations.
//!
//! Labels and statuses are the two project-scoped name catalogs; their
//! store shapes are intentionally symmetric.
//!
//! # Invariants
//! - `save` validates the document before writing.
//! - `find_by_name` is a case-sensitive exact match within one project;
//!   the schema's unique `(project_id, name)` indexes back it up.

use crate::model::label::{Label, LabelId};
use crate::model::project::ProjectId;
use crate::model::status::{Status, StatusId};
use crate::model::EntityKind;
use crate::store::{decode_doc, delete_doc, ensure_table, load_doc, save_doc, StoreResult};
use rusqlite::Connection;
use serde::de::DeserializeOwned;

const LABELS_TABLE: &str = "labels";
const STATUSES_TABLE: &str = "statuses";

/// Store contract for label documents.
pub trait LabelStore {
    fn get(&self, id: LabelId) -> StoreResult<Option<Label>>;
    fn find_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Label>>;
    /// Exact name match within one project.
    fn find_by_name(&self, project_id: ProjectId, name: &str) -> StoreResult<Option<Label>>;
    fn save(&self, label: &Label) -> StoreResult<()>;
    fn delete(&self, id: LabelId) -> StoreResult<()>;
}

/// Store contract for status documents.
pub trait StatusStore {
    fn get(&self, id: StatusId) -> StoreResult<Option<Status>>;
    fn find_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Status>>;
    /// Exact name match within one project.
    fn find_by_name(&self, project_id: ProjectId, name: &str) -> StoreResult<Option<Status>>;
    fn save(&self, status: &Status) -> StoreResult<()>;
    fn delete(&self, id: StatusId) -> StoreResult<()>;
}

fn scoped_list<T: DeserializeOwned>(
    conn: &Connection,
    table: &'static str,
    project_id: ProjectId,
) -> StoreResult<Vec<T>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT doc FROM {table}
         WHERE json_extract(doc, '$.project_id') = ?1
         ORDER BY json_extract(doc, '$.name') ASC;"
    ))?;
    let mut rows = stmt.query([project_id.to_string()])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let doc: String = row.get(0)?;
        entries.push(decode_doc(table, &doc)?);
    }
    Ok(entries)
}

fn scoped_find_by_name<T: DeserializeOwned>(
    conn: &Connection,
    table: &'static str,
    project_id: ProjectId,
    name: &str,
) -> StoreResult<Option<T>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT doc FROM {table}
         WHERE json_extract(doc, '$.project_id') = ?1
           AND json_extract(doc, '$.name') = ?2;"
    ))?;
    let mut rows = stmt.query([project_id.to_string(), name.to_string()])?;
    if let Some(row) = rows.next()? {
        let doc: String = row.get(0)?;
        return Ok(Some(decode_doc(table, &doc)?));
    }
    Ok(None)
}

/// SQLite-backed label store over the `labels` document table.
pub struct SqliteLabelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLabelStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table(conn, LABELS_TABLE)?;
        Ok(Self { conn })
    }
}

impl LabelStore for SqliteLabelStore<'_> {
    fn get(&self, id: LabelId) -> StoreResult<Option<Label>> {
        load_doc(self.conn, LABELS_TABLE, id)
    }

    fn find_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Label>> {
        scoped_list(self.conn, LABELS_TABLE, project_id)
    }

    fn find_by_name(&self, project_id: ProjectId, name: &str) -> StoreResult<Option<Label>> {
        scoped_find_by_name(self.conn, LABELS_TABLE, project_id, name)
    }

    fn save(&self, label: &Label) -> StoreResult<()> {
        label.validate()?;
        save_doc(self.conn, LABELS_TABLE, label.id, label)
    }

    fn delete(&self, id: LabelId) -> StoreResult<()> {
        delete_doc(self.conn, LABELS_TABLE, EntityKind::Label, id)
    }
}

/// SQLite-backed status store over the `statuses` document table.
pub struct SqliteStatusStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStatusStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table(conn, STATUSES_TABLE)?;
        Ok(Self { conn })
    }
}

impl StatusStore for SqliteStatusStore<'_> {
    fn get(&self, id: StatusId) -> StoreResult<Option<Status>> {
        load_doc(self.conn, STATUSES_TABLE, id)
    }

    fn find_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Status>> {
        scoped_list(self.conn, STATUSES_TABLE, project_id)
    }

    fn find_by_name(&self, project_id: ProjectId, name: &str) -> StoreResult<Option<Status>> {
        scoped_find_by_name(self.conn, STATUSES_TABLE, project_id, name)
    }

    fn save(&self, status: &Status) -> StoreResult<()> {
        status.validate()?;
        save_doc(self.conn, STATUSES_TABLE, status.id, status)
    }

    fn delete(&self, id: StatusId) -> StoreResult<()> {
        delete_doc(self.conn, STATUSES_TABLE, EntityKind::Status, id)
    }
}
