//! Label use-case service.
//!
//! # Responsibility
//! - Project-scoped label CRUD with name uniqueness.
//!
//! # Invariants
//! - Label names are unique within their project (exact match).
//! - Every operation is scoped to a project; a label reached with the
//!   wrong project id is reported as `ProjectMismatch`, never touched.

use crate::model::label::{Label, LabelId};
use crate::model::project::ProjectId;
use crate::model::EntityKind;
use crate::service::{name_conflict_backstop, not_found, uniqueness, CoreError, CoreResult};
use crate::store::catalog::LabelStore;

/// Service facade over the label store.
pub struct LabelService<L: LabelStore> {
    labels: L,
}

impl<L: LabelStore> LabelService<L> {
    /// Creates a service using the provided store implementation.
    pub fn new(labels: L) -> Self {
        Self { labels }
    }

    /// Creates a label in the project; `NameConflict` when the name is
    /// taken there.
    pub fn create_label(
        &self,
        project_id: ProjectId,
        name: &str,
        color: &str,
    ) -> CoreResult<Label> {
        uniqueness::check_create(EntityKind::Label, Some(project_id), name, |candidate| {
            Ok(self
                .labels
                .find_by_name(project_id, candidate)?
                .map(|label| label.id))
        })?;

        let label = Label::new(project_id, name, color);
        label.validate()?;
        self.labels
            .save(&label)
            .map_err(|err| name_conflict_backstop(EntityKind::Label, Some(project_id), name, err))?;
        Ok(label)
    }

    /// Labels of one project, sorted by name.
    pub fn list_labels(&self, project_id: ProjectId) -> CoreResult<Vec<Label>> {
        Ok(self.labels.find_by_project(project_id)?)
    }

    /// Gets one label when it exists and belongs to the project.
    pub fn get_label(&self, project_id: ProjectId, label_id: LabelId) -> CoreResult<Option<Label>> {
        Ok(self
            .labels
            .get(label_id)?
            .filter(|label| label.project_id == project_id))
    }

    /// Renames/recolors a label. Renaming to its own current name is not a
    /// conflict.
    pub fn update_label(
        &self,
        project_id: ProjectId,
        label_id: LabelId,
        name: &str,
        color: &str,
    ) -> CoreResult<Label> {
        let mut label = self
            .labels
            .get(label_id)?
            .ok_or_else(|| not_found(EntityKind::Label, label_id))?;
        if label.project_id != project_id {
            return Err(CoreError::ProjectMismatch {
                entity: EntityKind::Label,
                id: label_id,
                project_id,
            });
        }

        uniqueness::check_rename(
            EntityKind::Label,
            Some(project_id),
            name,
            label_id,
            |candidate| {
                Ok(self
                    .labels
                    .find_by_name(project_id, candidate)?
                    .map(|existing| existing.id))
            },
        )?;

        label.name = name.to_string();
        label.color = color.to_string();
        label.validate()?;
        self.labels
            .save(&label)
            .map_err(|err| name_conflict_backstop(EntityKind::Label, Some(project_id), name, err))?;
        Ok(label)
    }

    /// Deletes a label from its project.
    ///
    /// Tasks referencing the label keep the id; label references are free
    /// references checked at their use sites.
    pub fn delete_label(&self, project_id: ProjectId, label_id: LabelId) -> CoreResult<()> {
        let label = self
            .labels
            .get(label_id)?
            .ok_or_else(|| not_found(EntityKind::Label, label_id))?;
        if label.project_id != project_id {
            return Err(CoreError::ProjectMismatch {
                entity: EntityKind::Label,
                id: label_id,
                project_id,
            });
        }

        self.labels.delete(label_id)?;
        Ok(())
    }
}
