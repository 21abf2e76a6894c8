//! Project store contract and SQLite implementation.
//!
//! # Invariants
//! - `save` validates the document before writing.
//! - `find_by_member` scans the serialized member set (reverse edge of
//!   `User::project_ids`), used by the partial-failure tolerant read path.

use crate::model::project::{Project, ProjectId};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::store::{
    decode_doc, delete_doc, ensure_table, load_doc, load_docs_by_ids, save_doc, StoreResult,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

const TABLE: &str = "projects";

/// Store contract for project documents.
pub trait ProjectStore {
    fn get(&self, id: ProjectId) -> StoreResult<Option<Project>>;
    /// Loads projects for an id set; absent ids are skipped.
    fn get_many(&self, ids: &BTreeSet<ProjectId>) -> StoreResult<Vec<Project>>;
    /// Projects whose `team_member_ids` contains `user_id`.
    fn find_by_member(&self, user_id: UserId) -> StoreResult<Vec<Project>>;
    fn save(&self, project: &Project) -> StoreResult<()>;
    fn delete(&self, id: ProjectId) -> StoreResult<()>;
}

/// SQLite-backed project store over the `projects` document table.
pub struct SqliteProjectStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table(conn, TABLE)?;
        Ok(Self { conn })
    }
}

impl ProjectStore for SqliteProjectStore<'_> {
    fn get(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        load_doc(self.conn, TABLE, id)
    }

    fn get_many(&self, ids: &BTreeSet<ProjectId>) -> StoreResult<Vec<Project>> {
        load_docs_by_ids(self.conn, TABLE, ids)
    }

    fn find_by_member(&self, user_id: UserId) -> StoreResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT doc FROM {TABLE}
             WHERE EXISTS (
                SELECT 1 FROM json_each(doc, '$.team_member_ids') AS member
                WHERE member.value = ?1
             )
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            let doc: String = row.get(0)?;
            projects.push(decode_doc(TABLE, &doc)?);
        }
        Ok(projects)
    }

    fn save(&self, project: &Project) -> StoreResult<()> {
        project.validate()?;
        save_doc(self.conn, TABLE, project.id, project)
    }

    fn delete(&self, id: ProjectId) -> StoreResult<()> {
        delete_doc(self.conn, TABLE, EntityKind::Project, id)
    }
}
