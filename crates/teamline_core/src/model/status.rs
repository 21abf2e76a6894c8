//! Status domain model.
//!
//! A status is a project-defined column/state a task can point at. It is
//! not a transition-guarded lifecycle: any status in the project may be
//! assigned to any task at any time.
//!
//! # Invariants
//! - `project_id` is set at creation and never changes.
//! - `name` is unique within the owning project (case-sensitive exact
//!   match), enforced by the status service and backed by a store index.

use crate::model::project::ProjectId;
use crate::model::{require_hex_color, require_non_blank, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable status identifier.
pub type StatusId = Uuid;

/// Project-scoped workflow state for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Stable global id.
    pub id: StatusId,
    /// Unique within `project_id`.
    pub name: String,
    /// Display color, `#RRGGBB`.
    pub color: String,
    /// Owning project; immutable.
    pub project_id: ProjectId,
}

impl Status {
    /// Creates a status in `project_id` with a generated id.
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.into(),
            project_id,
        }
    }

    /// Checks field formats. Store write paths call this before persisting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(EntityKind::Status, "name", &self.name)?;
        require_non_blank(EntityKind::Status, "color", &self.color)?;
        require_hex_color(&self.color)?;
        Ok(())
    }
}
