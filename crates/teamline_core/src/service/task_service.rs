//! Task use-case service.
//!
//! # Responsibility
//! - Task CRUD, filtering, and the label/status/assignee reference edges.
//!
//! # Invariants
//! - Task titles are unique within their project (exact match).
//! - Status and label references are existence-checked against the task's
//!   project before they are assigned.
//! - Assignees must be current team members of the task's project.
//! - `updated_at` is bumped on every persisted mutation.
//! - Dependency edges are not reachable from here; they are owned by the
//!   dependency graph manager, task deletion included.

use crate::model::label::LabelId;
use crate::model::project::ProjectId;
use crate::model::status::StatusId;
use crate::model::task::{Task, TaskId};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::service::{name_conflict_backstop, not_found, uniqueness, CoreError, CoreResult};
use crate::store::catalog::{LabelStore, StatusStore};
use crate::store::projects::ProjectStore;
use crate::store::tasks::TaskStore;
use std::collections::BTreeSet;

/// Fields for a new task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status_id: Option<StatusId>,
    pub label_ids: BTreeSet<LabelId>,
    /// Epoch milliseconds.
    pub due_date: Option<i64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub estimated_hours: Option<f64>,
}

/// Partial task update; `None` leaves the field untouched.
///
/// Dependency edges are deliberately absent from this patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status_id: Option<StatusId>,
    pub label_ids: Option<BTreeSet<LabelId>>,
    pub due_date: Option<i64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
}

/// Service facade over task, catalog and project stores.
pub struct TaskService<T, L, S, P>
where
    T: TaskStore,
    L: LabelStore,
    S: StatusStore,
    P: ProjectStore,
{
    tasks: T,
    labels: L,
    statuses: S,
    projects: P,
}

impl<T, L, S, P> TaskService<T, L, S, P>
where
    T: TaskStore,
    L: LabelStore,
    S: StatusStore,
    P: ProjectStore,
{
    /// Creates a service using the provided store implementations.
    pub fn new(tasks: T, labels: L, statuses: S, projects: P) -> Self {
        Self {
            tasks,
            labels,
            statuses,
            projects,
        }
    }

    /// Creates a task in the project; `NameConflict` when the title is
    /// taken there.
    pub fn create_task(&self, project_id: ProjectId, draft: TaskDraft) -> CoreResult<Task> {
        self.projects
            .get(project_id)?
            .ok_or_else(|| not_found(EntityKind::Project, project_id))?;

        uniqueness::check_create(EntityKind::Task, Some(project_id), &draft.title, |title| {
            Ok(self
                .tasks
                .find_by_title(project_id, title)?
                .map(|task| task.id))
        })?;

        if let Some(status_id) = draft.status_id {
            self.status_in_project(project_id, status_id)?;
        }
        self.labels_in_project(project_id, &draft.label_ids)?;

        let mut task = Task::new(project_id, draft.title);
        task.description = draft.description;
        task.status_id = draft.status_id;
        task.label_ids = draft.label_ids;
        task.due_date = draft.due_date;
        task.start_date = draft.start_date;
        task.end_date = draft.end_date;
        task.estimated_hours = draft.estimated_hours;
        task.validate()?;

        let title = task.title.clone();
        self.tasks.save(&task).map_err(|err| {
            name_conflict_backstop(EntityKind::Task, Some(project_id), &title, err)
        })?;
        Ok(task)
    }

    /// Gets one task when it exists and belongs to the project.
    pub fn get_task(&self, project_id: ProjectId, task_id: TaskId) -> CoreResult<Option<Task>> {
        Ok(self
            .tasks
            .get(task_id)?
            .filter(|task| task.project_id == project_id))
    }

    /// All tasks of one project in creation order.
    pub fn list_tasks(&self, project_id: ProjectId) -> CoreResult<Vec<Task>> {
        Ok(self.tasks.find_by_project(project_id)?)
    }

    /// Project tasks narrowed by optional status and/or label.
    pub fn list_filtered(
        &self,
        project_id: ProjectId,
        status_id: Option<StatusId>,
        label_id: Option<LabelId>,
    ) -> CoreResult<Vec<Task>> {
        Ok(self.tasks.find_filtered(project_id, status_id, label_id)?)
    }

    /// Applies a partial update to a task.
    pub fn update_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> CoreResult<Task> {
        let mut task = self.task_in_project(project_id, task_id)?;

        if let Some(title) = patch.title {
            uniqueness::check_rename(
                EntityKind::Task,
                Some(project_id),
                &title,
                task_id,
                |candidate| {
                    Ok(self
                        .tasks
                        .find_by_title(project_id, candidate)?
                        .map(|existing| existing.id))
                },
            )?;
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status_id) = patch.status_id {
            self.status_in_project(project_id, status_id)?;
            task.status_id = Some(status_id);
        }
        if let Some(label_ids) = patch.label_ids {
            self.labels_in_project(project_id, &label_ids)?;
            task.label_ids = label_ids;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(start_date) = patch.start_date {
            task.start_date = Some(start_date);
        }
        if let Some(end_date) = patch.end_date {
            task.end_date = Some(end_date);
        }
        if let Some(estimated_hours) = patch.estimated_hours {
            task.estimated_hours = Some(estimated_hours);
        }
        if let Some(actual_hours) = patch.actual_hours {
            task.actual_hours = Some(actual_hours);
        }
        task.validate()?;
        task.touch();

        let title = task.title.clone();
        self.tasks.save(&task).map_err(|err| {
            name_conflict_backstop(EntityKind::Task, Some(project_id), &title, err)
        })?;
        Ok(task)
    }

    /// Assigns a status (or clears it with `None`). The status must exist
    /// in the task's project.
    pub fn update_task_status(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        status_id: Option<StatusId>,
    ) -> CoreResult<Task> {
        let mut task = self.task_in_project(project_id, task_id)?;

        if let Some(status_id) = status_id {
            self.status_in_project(project_id, status_id)?;
        }
        task.status_id = status_id;
        task.touch();
        self.tasks.save(&task)?;
        Ok(task)
    }

    /// Attaches a project label to the task. Idempotent.
    pub fn add_label(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        label_id: LabelId,
    ) -> CoreResult<Task> {
        let mut task = self.task_in_project(project_id, task_id)?;
        self.label_in_project(project_id, label_id)?;

        if !task.label_ids.insert(label_id) {
            return Ok(task);
        }
        task.touch();
        self.tasks.save(&task)?;
        Ok(task)
    }

    /// Detaches a label from the task; no-op when absent.
    pub fn remove_label(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        label_id: LabelId,
    ) -> CoreResult<Task> {
        let mut task = self.task_in_project(project_id, task_id)?;
        self.label_in_project(project_id, label_id)?;

        if !task.label_ids.remove(&label_id) {
            return Ok(task);
        }
        task.touch();
        self.tasks.save(&task)?;
        Ok(task)
    }

    /// Assigns a team member to the task. Idempotent.
    pub fn add_assignee(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> CoreResult<Task> {
        let mut task = self.task_in_project(project_id, task_id)?;
        self.member_of_project(project_id, user_id)?;

        if !task.assignee_ids.insert(user_id) {
            return Ok(task);
        }
        task.touch();
        self.tasks.save(&task)?;
        Ok(task)
    }

    /// Unassigns a user from the task; no-op when absent.
    pub fn remove_assignee(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> CoreResult<Task> {
        let mut task = self.task_in_project(project_id, task_id)?;

        if !task.assignee_ids.remove(&user_id) {
            return Ok(task);
        }
        task.touch();
        self.tasks.save(&task)?;
        Ok(task)
    }

    fn task_in_project(&self, project_id: ProjectId, task_id: TaskId) -> CoreResult<Task> {
        let task = self
            .tasks
            .get(task_id)?
            .ok_or_else(|| not_found(EntityKind::Task, task_id))?;
        if task.project_id != project_id {
            return Err(CoreError::ProjectMismatch {
                entity: EntityKind::Task,
                id: task_id,
                project_id,
            });
        }
        Ok(task)
    }

    fn status_in_project(&self, project_id: ProjectId, status_id: StatusId) -> CoreResult<()> {
        self.statuses
            .get(status_id)?
            .filter(|status| status.project_id == project_id)
            .ok_or_else(|| not_found(EntityKind::Status, status_id))?;
        Ok(())
    }

    fn label_in_project(&self, project_id: ProjectId, label_id: LabelId) -> CoreResult<()> {
        self.labels
            .get(label_id)?
            .filter(|label| label.project_id == project_id)
            .ok_or_else(|| not_found(EntityKind::Label, label_id))?;
        Ok(())
    }

    fn labels_in_project(
        &self,
        project_id: ProjectId,
        label_ids: &BTreeSet<LabelId>,
    ) -> CoreResult<()> {
        for label_id in label_ids {
            self.label_in_project(project_id, *label_id)?;
        }
        Ok(())
    }

    fn member_of_project(&self, project_id: ProjectId, user_id: UserId) -> CoreResult<()> {
        let project = self
            .projects
            .get(project_id)?
            .ok_or_else(|| not_found(EntityKind::Project, project_id))?;
        if !project.has_member(user_id) {
            return Err(CoreError::ProjectMismatch {
                entity: EntityKind::User,
                id: user_id,
                project_id,
            });
        }
        Ok(())
    }
}
