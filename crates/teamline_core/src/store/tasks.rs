//! Task store contract and SQLite implementation.
//!
//! # Invariants
//! - `save` validates the document before writing.
//! - `find_dependents` is the reverse-edge scan used before a task is
//!   deleted; it searches the whole table, not one project, so stale
//!   cross-project edges are found and healed too.
//! - Listing order is deterministic: `created_at ASC, id ASC`.

use crate::model::label::LabelId;
use crate::model::project::ProjectId;
use crate::model::status::StatusId;
use crate::model::task::{Task, TaskId};
use crate::model::EntityKind;
use crate::store::{decode_doc, delete_doc, ensure_table, load_doc, save_doc, StoreResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

const TABLE: &str = "tasks";

const TASK_ORDER_SQL: &str = "ORDER BY json_extract(doc, '$.created_at') ASC, id ASC";

/// Store contract for task documents.
pub trait TaskStore {
    fn get(&self, id: TaskId) -> StoreResult<Option<Task>>;
    fn find_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Task>>;
    /// Project tasks narrowed by optional status and/or label.
    fn find_filtered(
        &self,
        project_id: ProjectId,
        status_id: Option<StatusId>,
        label_id: Option<LabelId>,
    ) -> StoreResult<Vec<Task>>;
    /// Exact title match within one project.
    fn find_by_title(&self, project_id: ProjectId, title: &str) -> StoreResult<Option<Task>>;
    /// Every task whose `dependency_ids` contains `task_id`.
    fn find_dependents(&self, task_id: TaskId) -> StoreResult<Vec<Task>>;
    fn save(&self, task: &Task) -> StoreResult<()>;
    /// Saves each document with an independent single-row write.
    fn save_all(&self, tasks: &[Task]) -> StoreResult<()>;
    fn delete(&self, id: TaskId) -> StoreResult<()>;
}

/// SQLite-backed task store over the `tasks` document table.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table(conn, TABLE)?;
        Ok(Self { conn })
    }

    fn query_docs(&self, sql: &str, bind_values: Vec<Value>) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let doc: String = row.get(0)?;
            tasks.push(decode_doc(TABLE, &doc)?);
        }
        Ok(tasks)
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        load_doc(self.conn, TABLE, id)
    }

    fn find_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Task>> {
        self.find_filtered(project_id, None, None)
    }

    fn find_filtered(
        &self,
        project_id: ProjectId,
        status_id: Option<StatusId>,
        label_id: Option<LabelId>,
    ) -> StoreResult<Vec<Task>> {
        let mut sql = format!(
            "SELECT doc FROM {TABLE}
             WHERE json_extract(doc, '$.project_id') = ?"
        );
        let mut bind_values = vec![Value::Text(project_id.to_string())];

        if let Some(status_id) = status_id {
            sql.push_str(" AND json_extract(doc, '$.status_id') = ?");
            bind_values.push(Value::Text(status_id.to_string()));
        }

        if let Some(label_id) = label_id {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM json_each(doc, '$.label_ids') AS label
                    WHERE label.value = ?
                )",
            );
            bind_values.push(Value::Text(label_id.to_string()));
        }

        sql.push(' ');
        sql.push_str(TASK_ORDER_SQL);
        self.query_docs(&sql, bind_values)
    }

    fn find_by_title(&self, project_id: ProjectId, title: &str) -> StoreResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT doc FROM {TABLE}
             WHERE json_extract(doc, '$.project_id') = ?1
               AND json_extract(doc, '$.title') = ?2;"
        ))?;
        let mut rows = stmt.query([project_id.to_string(), title.to_string()])?;
        if let Some(row) = rows.next()? {
            let doc: String = row.get(0)?;
            return Ok(Some(decode_doc(TABLE, &doc)?));
        }
        Ok(None)
    }

    fn find_dependents(&self, task_id: TaskId) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT doc FROM {TABLE}
             WHERE EXISTS (
                SELECT 1 FROM json_each(doc, '$.dependency_ids') AS dep
                WHERE dep.value = ?
             )
             {TASK_ORDER_SQL};"
        );
        self.query_docs(&sql, vec![Value::Text(task_id.to_string())])
    }

    fn save(&self, task: &Task) -> StoreResult<()> {
        task.validate()?;
        save_doc(self.conn, TABLE, task.id, task)
    }

    fn save_all(&self, tasks: &[Task]) -> StoreResult<()> {
        for task in tasks {
            self.save(task)?;
        }
        Ok(())
    }

    fn delete(&self, id: TaskId) -> StoreResult<()> {
        delete_doc(self.conn, TABLE, EntityKind::Task, id)
    }
}
