//! Dependency graph manager.
//!
//! # Responsibility
//! - Maintain directed Task -> Task dependency edges within one project.
//! - Guarantee no edge survives the deletion of its target.
//!
//! # Invariants
//! - Dependency edges are mutated only through this manager.
//! - Both ends of an edge live in the same project.
//! - Edge mutation is idempotent: re-adding an existing edge and removing
//!   an absent edge are no-op successes that do not touch the document.
//!
//! The graph is not checked for cycles; A -> B -> A is representable and
//! allowed.

use crate::model::project::ProjectId;
use crate::model::task::{Task, TaskId};
use crate::model::EntityKind;
use crate::service::coordinator::{run_sequence, RetryPolicy, WriteStep};
use crate::service::{not_found, CoreError, CoreResult};
use crate::store::tasks::TaskStore;

/// Service owning every mutation of the task dependency relation.
pub struct DependencyService<T: TaskStore> {
    tasks: T,
    retry: RetryPolicy,
}

impl<T: TaskStore> DependencyService<T> {
    /// Creates a service using the provided store implementation.
    pub fn new(tasks: T) -> Self {
        Self {
            tasks,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the coordinator retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Adds the edge `task_id -> dependency_id`.
    ///
    /// The self-edge check runs before anything is read, so a task can
    /// never depend on itself regardless of store state. Both tasks must
    /// exist in `project_id`.
    pub fn add_dependency(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        dependency_id: TaskId,
    ) -> CoreResult<Task> {
        if task_id == dependency_id {
            return Err(CoreError::SelfDependency(task_id));
        }

        let mut task = self.task_in_project(project_id, task_id)?;
        self.task_in_project(project_id, dependency_id)?;

        if task.dependency_ids.contains(&dependency_id) {
            return Ok(task);
        }

        task.dependency_ids.insert(dependency_id);
        task.touch();
        self.tasks.save(&task)?;
        Ok(task)
    }

    /// Removes the edge `task_id -> dependency_id` if present.
    ///
    /// Only the owning task must exist; removing an edge whose target is
    /// already gone is how stale references get cleaned up.
    pub fn remove_dependency(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        dependency_id: TaskId,
    ) -> CoreResult<Task> {
        let mut task = self.task_in_project(project_id, task_id)?;

        if !task.dependency_ids.remove(&dependency_id) {
            return Ok(task);
        }

        task.touch();
        self.tasks.save(&task)?;
        Ok(task)
    }

    /// Deletes a task after stripping it from every dependent task.
    ///
    /// The reverse-edge scan and dependent rewrites run before the target
    /// document is removed, so a crash in between leaves the task alive
    /// with fewer incoming edges, a state a retry heals, rather than
    /// dangling edges to a task that no longer exists.
    pub fn delete_task(&self, project_id: ProjectId, task_id: TaskId) -> CoreResult<()> {
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

        let tasks = &self.tasks;
        let steps = vec![
            WriteStep::new("unlink_dependents", move || {
                let mut dependents = tasks.find_dependents(task_id)?;
                for dependent in &mut dependents {
                    dependent.dependency_ids.remove(&task_id);
                    dependent.touch();
                }
                tasks.save_all(&dependents)
            }),
            WriteStep::new("delete_task", move || tasks.delete(task_id)),
        ];
        run_sequence("delete_task", steps, &self.retry)?;

        Ok(())
    }

    fn task_in_project(&self, project_id: ProjectId, task_id: TaskId) -> CoreResult<Task> {
        let task = self
            .tasks
            .get(task_id)?
            .ok_or_else(|| not_found(EntityKind::Task, task_id))?;
        if task.project_id != project_id {
            return Err(not_found(EntityKind::Task, task_id));
        }
        Ok(task)
    }
}
