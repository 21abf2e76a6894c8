//! Label domain model.
//!
//! # Invariants
//! - `project_id` is set at creation and never changes.
//! - `name` is unique within the owning project (case-sensitive exact
//!   match), enforced by the label service and backed by a store index.

use crate::model::project::ProjectId;
use crate::model::{require_hex_color, require_non_blank, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable label identifier.
pub type LabelId = Uuid;

/// Project-scoped categorization tag for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Stable global id.
    pub id: LabelId,
    /// Unique within `project_id`.
    pub name: String,
    /// Display color, `#RRGGBB`.
    pub color: String,
    /// Owning project; immutable.
    pub project_id: ProjectId,
}

impl Label {
    /// Creates a label in `project_id` with a generated id.
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
        require_non_blank(EntityKind::Label, "name", &self.name)?;
        require_non_blank(EntityKind::Label, "color", &self.color)?;
        require_hex_color(&self.color)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Label;
    use crate::model::ValidationError;
    use uuid::Uuid;

    #[test]
    fn label_color_must_be_hex() {
        let label = Label::new(Uuid::new_v4(), "Bug", "crimson");
        assert!(matches!(
            label.validate().unwrap_err(),
            ValidationError::InvalidColor(_)
        ));
        assert!(Label::new(Uuid::new_v4(), "Bug", "#d73a4a").validate().is_ok());
    }
}
