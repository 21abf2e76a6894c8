//! Task domain model.
//!
//! # Invariants
//! - `project_id` and `created_at` are set at creation and never change.
//! - `updated_at` is bumped on every persisted mutation.
//! - `dependency_ids` entries reference tasks in the same project; the set
//!   is mutated only through the dependency graph manager.
//! - `status_id` and `label_ids` are free references into the owning
//!   project's catalogs, existence-checked when assigned.

use crate::model::label::LabelId;
use crate::model::project::ProjectId;
use crate::model::status::StatusId;
use crate::model::user::UserId;
use crate::model::{now_epoch_ms, require_non_blank, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Unit of work inside one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global id.
    pub id: TaskId,
    /// Owning project; immutable.
    pub project_id: ProjectId,
    /// Unique within the owning project.
    pub title: String,
    pub description: String,
    pub label_ids: BTreeSet<LabelId>,
    pub status_id: Option<StatusId>,
    /// Tasks this task depends on.
    pub dependency_ids: BTreeSet<TaskId>,
    pub assignee_ids: BTreeSet<UserId>,
    /// Epoch milliseconds; user-set schedule fields.
    pub due_date: Option<i64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    /// Epoch milliseconds; immutable after creation.
    pub created_at: i64,
    /// Epoch milliseconds; bumped on every mutation.
    pub updated_at: i64,
}

impl Task {
    /// Creates a task in `project_id` with creation timestamps set.
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.into(),
            description: String::new(),
            label_ids: BTreeSet::new(),
            status_id: None,
            dependency_ids: BTreeSet::new(),
            assignee_ids: BTreeSet::new(),
            due_date: None,
            start_date: None,
            end_date: None,
            estimated_hours: None,
            actual_hours: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks field formats. Store write paths call this before persisting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(EntityKind::Task, "title", &self.title)?;
        Ok(())
    }

    /// Marks this task as mutated.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms();
    }
}
