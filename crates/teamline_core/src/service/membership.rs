//! Membership consistency manager.
//!
//! # Responsibility
//! - Keep the bidirectional Project/User membership edge correct across
//!   independently stored documents: every id in a project's
//!   `team_member_ids` appears in that user's `project_ids` and vice
//!   versa, and the owner is always a member.
//!
//! # Invariants
//! - Membership state is mutated only through this manager.
//! - Multi-document writes run through the integrity coordinator; step
//!   ordering is chosen so the failure-prone tail write is the least
//!   harmful to lose.
//! - Deterministic checks (existence, ownership) run before any write.

use crate::model::project::{Project, ProjectId};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::service::coordinator::{run_sequence, RetryPolicy, WriteStep};
use crate::service::{not_found, CoreError, CoreResult};
use crate::store::projects::ProjectStore;
use crate::store::users::UserStore;
use crate::store::StoreError;
use std::collections::{BTreeMap, BTreeSet};

/// Profile fields for a new project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    /// Optional schedule bounds in epoch milliseconds.
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

/// Partial profile update; `None` leaves the field untouched. Ownership
/// and membership are not reachable through this patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

/// Service owning every mutation of "who belongs to a project".
pub struct MembershipService<U: UserStore, P: ProjectStore> {
    users: U,
    projects: P,
    retry: RetryPolicy,
}

impl<U: UserStore, P: ProjectStore> MembershipService<U, P> {
    /// Creates a service using the provided store implementations.
    pub fn new(users: U, projects: P) -> Self {
        Self {
            users,
            projects,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the coordinator retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Creates a project owned by `owner_user_id`.
    ///
    /// The project document is written first, then the owner's
    /// `project_ids` is linked. Losing the tail write leaves a project
    /// whose owner link is missing, which the read path tolerates and a
    /// reconciliation pass can repair; the reverse order could leave a
    /// user pointing at a project that never came to exist.
    pub fn create_project(
        &self,
        owner_user_id: UserId,
        draft: ProjectDraft,
    ) -> CoreResult<Project> {
        self.users
            .get(owner_user_id)?
            .ok_or_else(|| not_found(EntityKind::User, owner_user_id))?;

        let mut project = Project::new(owner_user_id, draft.title);
        project.description = draft.description;
        project.start_date = draft.start_date;
        project.end_date = draft.end_date;
        project.validate()?;

        let project_id = project.id;
        let users = &self.users;
        let projects = &self.projects;
        let saved = project.clone();
        let steps = vec![
            WriteStep::new("save_project", move || projects.save(&saved)),
            WriteStep::new("link_owner", move || {
                let mut owner =
                    users
                        .get(owner_user_id)?
                        .ok_or(StoreError::NotFound {
                            entity: EntityKind::User,
                            id: owner_user_id,
                        })?;
                owner.project_ids.insert(project_id);
                users.save(&owner)
            }),
        ];
        run_sequence("create_project", steps, &self.retry)?;

        Ok(project)
    }

    /// Deletes a project and strips it from every member's `project_ids`.
    ///
    /// Only the owner may delete. Member cleanup runs before the project
    /// document is removed: a crash in between leaves an orphaned but
    /// internally consistent project, never dangling member references.
    pub fn delete_project(&self, requester_id: UserId, project_id: ProjectId) -> CoreResult<()> {
        let project = self
            .projects
            .get(project_id)?
            .ok_or_else(|| not_found(EntityKind::Project, project_id))?;
        if project.owner_user_id != requester_id {
            return Err(CoreError::Forbidden {
                detail: format!("user {requester_id} does not own project {project_id}"),
            });
        }

        let member_ids = project.team_member_ids;
        let users = &self.users;
        let projects = &self.projects;
        let steps = vec![
            WriteStep::new("unlink_members", move || {
                let mut members = users.get_many(&member_ids)?;
                members.retain(|member| member.project_ids.contains(&project_id));
                for member in &mut members {
                    member.project_ids.remove(&project_id);
                }
                users.save_all(&members)
            }),
            WriteStep::new("delete_project", move || projects.delete(project_id)),
        ];
        run_sequence("delete_project", steps, &self.retry)?;

        Ok(())
    }

    /// Replaces the project's team with `new_member_ids`.
    ///
    /// The owner is silently re-added when omitted: owner membership
    /// cannot be revoked here. Every added member must exist, since a member
    /// edge to a missing user would break the symmetric relation by
    /// construction.
    pub fn replace_team_members(
        &self,
        requester_id: UserId,
        project_id: ProjectId,
        new_member_ids: BTreeSet<UserId>,
    ) -> CoreResult<Project> {
        let mut project = self
            .projects
            .get(project_id)?
            .ok_or_else(|| not_found(EntityKind::Project, project_id))?;
        if project.owner_user_id != requester_id {
            return Err(CoreError::Forbidden {
                detail: format!("user {requester_id} does not own project {project_id}"),
            });
        }

        let mut target = new_member_ids;
        target.insert(project.owner_user_id);

        let removed: BTreeSet<UserId> = project
            .team_member_ids
            .difference(&target)
            .copied()
            .collect();
        let added: BTreeSet<UserId> = target
            .difference(&project.team_member_ids)
            .copied()
            .collect();

        let found: BTreeSet<UserId> = self
            .users
            .get_many(&added)?
            .into_iter()
            .map(|user| user.id)
            .collect();
        if let Some(missing) = added.difference(&found).next() {
            return Err(not_found(EntityKind::User, *missing));
        }

        project.team_member_ids = target;
        if removed.is_empty() && added.is_empty() {
            return Ok(project);
        }

        let users = &self.users;
        let projects = &self.projects;
        let saved = project.clone();
        let steps = vec![
            WriteStep::new("unlink_removed_members", move || {
                let mut members = users.get_many(&removed)?;
                for member in &mut members {
                    member.project_ids.remove(&project_id);
                }
                users.save_all(&members)
            }),
            WriteStep::new("link_added_members", move || {
                let mut members = users.get_many(&added)?;
                for member in &mut members {
                    member.project_ids.insert(project_id);
                }
                users.save_all(&members)
            }),
            WriteStep::new("save_project", move || projects.save(&saved)),
        ];
        run_sequence("replace_team_members", steps, &self.retry)?;

        Ok(project)
    }

    /// Updates project profile fields. Requester must be a team member.
    pub fn update_project(
        &self,
        requester_id: UserId,
        project_id: ProjectId,
        patch: ProjectPatch,
    ) -> CoreResult<Project> {
        let mut project = self
            .projects
            .get(project_id)?
            .ok_or_else(|| not_found(EntityKind::Project, project_id))?;
        if !project.has_member(requester_id) {
            return Err(CoreError::Forbidden {
                detail: format!(
                    "user {requester_id} is not a member of project {project_id}"
                ),
            });
        }

        if let Some(title) = patch.title {
            project.title = title;
        }
        if let Some(description) = patch.description {
            project.description = description;
        }
        if let Some(start_date) = patch.start_date {
            project.start_date = Some(start_date);
        }
        if let Some(end_date) = patch.end_date {
            project.end_date = Some(end_date);
        }
        project.validate()?;

        self.projects.save(&project)?;
        Ok(project)
    }

    /// Projects the user owns or belongs to.
    ///
    /// Reads both directions of the membership edge (the user's
    /// `project_ids` and a reverse scan of project member sets) and
    /// merges them, so documents left behind by an earlier partial
    /// failure still show up.
    pub fn projects_for_user(&self, user_id: UserId) -> CoreResult<Vec<Project>> {
        let user = self
            .users
            .get(user_id)?
            .ok_or_else(|| not_found(EntityKind::User, user_id))?;

        let mut merged: BTreeMap<ProjectId, Project> = BTreeMap::new();
        for project in self.projects.get_many(&user.project_ids)? {
            merged.insert(project.id, project);
        }
        for project in self.projects.find_by_member(user_id)? {
            merged.insert(project.id, project);
        }

        Ok(merged.into_values().collect())
    }
}
