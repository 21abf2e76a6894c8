//! Status use-case service.
//!
//! Deliberately symmetric with the label service; statuses and labels are
//! the two project-scoped name catalogs.

use crate::model::project::ProjectId;
use crate::model::status::{Status, StatusId};
use crate::model::EntityKind;
use crate::service::{name_conflict_backstop, not_found, uniqueness, CoreError, CoreResult};
use crate::store::catalog::StatusStore;

/// Service facade over the status store.
pub struct StatusService<S: StatusStore> {
    statuses: S,
}

impl<S: StatusStore> StatusService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(statuses: S) -> Self {
        Self { statuses }
    }

    /// Creates a status in the project; `NameConflict` when the name is
    /// taken there.
    pub fn create_status(
        &self,
        project_id: ProjectId,
        name: &str,
        color: &str,
    ) -> CoreResult<Status> {
        uniqueness::check_create(EntityKind::Status, Some(project_id), name, |candidate| {
            Ok(self
                .statuses
                .find_by_name(project_id, candidate)?
                .map(|status| status.id))
        })?;

        let status = Status::new(project_id, name, color);
        status.validate()?;
        self.statuses.save(&status).map_err(|err| {
            name_conflict_backstop(EntityKind::Status, Some(project_id), name, err)
        })?;
        Ok(status)
    }

    /// Statuses of one project, sorted by name.
    pub fn list_statuses(&self, project_id: ProjectId) -> CoreResult<Vec<Status>> {
        Ok(self.statuses.find_by_project(project_id)?)
    }

    /// Gets one status when it exists and belongs to the project.
    pub fn get_status(
        &self,
        project_id: ProjectId,
        status_id: StatusId,
    ) -> CoreResult<Option<Status>> {
        Ok(self
            .statuses
            .get(status_id)?
            .filter(|status| status.project_id == project_id))
    }

    /// Renames/recolors a status. Renaming to its own current name is not
    /// a conflict.
    pub fn update_status(
        &self,
        project_id: ProjectId,
        status_id: StatusId,
        name: &str,
        color: &str,
    ) -> CoreResult<Status> {
        let mut status = self
            .statuses
            .get(status_id)?
            .ok_or_else(|| not_found(EntityKind::Status, status_id))?;
        if status.project_id != project_id {
            return Err(CoreError::ProjectMismatch {
                entity: EntityKind::Status,
                id: status_id,
                project_id,
            });
        }

        uniqueness::check_rename(
            EntityKind::Status,
            Some(project_id),
            name,
            status_id,
            |candidate| {
                Ok(self
                    .statuses
                    .find_by_name(project_id, candidate)?
                    .map(|existing| existing.id))
            },
        )?;

        status.name = name.to_string();
        status.color = color.to_string();
        status.validate()?;
        self.statuses.save(&status).map_err(|err| {
            name_conflict_backstop(EntityKind::Status, Some(project_id), name, err)
        })?;
        Ok(status)
    }

    /// Deletes a status from its project.
    ///
    /// Tasks referencing the status keep the id; status references are
    /// free references checked at their use sites.
    pub fn delete_status(&self, project_id: ProjectId, status_id: StatusId) -> CoreResult<()> {
        let status = self
            .statuses
            .get(status_id)?
            .ok_or_else(|| not_found(EntityKind::Status, status_id))?;
        if status.project_id != project_id {
            return Err(CoreError::ProjectMismatch {
                entity: EntityKind::Status,
                id: status_id,
                project_id,
            });
        }

        self.statuses.delete(status_id)?;
        Ok(())
    }
}
