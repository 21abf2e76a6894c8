//! Project domain model.
//!
//! # Invariants
//! - `owner_user_id` is set at creation and never changes.
//! - `owner_user_id` is always an element of `team_member_ids`.
//! - `team_member_ids` mirrors `User::project_ids`; both sides are mutated
//!   only through the membership manager.

use crate::model::user::UserId;
use crate::model::{require_non_blank, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Project document owning membership state and profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable global id.
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    /// Optional schedule bounds in epoch milliseconds.
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    /// Creator; immutable and always a team member.
    pub owner_user_id: UserId,
    /// Users belonging to this project, owner included.
    pub team_member_ids: BTreeSet<UserId>,
}

impl Project {
    /// Creates a project owned by `owner_user_id` with the owner as the
    /// only team member.
    pub fn new(owner_user_id: UserId, title: impl Into<String>) -> Self {
        let mut team_member_ids = BTreeSet::new();
        team_member_ids.insert(owner_user_id);
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            start_date: None,
            end_date: None,
            owner_user_id,
            team_member_ids,
        }
    }

    /// Checks field formats. Store write paths call this before persisting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(EntityKind::Project, "title", &self.title)?;
        Ok(())
    }

    /// Whether `user_id` is the owner or a team member.
    pub fn has_member(&self, user_id: UserId) -> bool {
        self.team_member_ids.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::Project;
    use uuid::Uuid;

    #[test]
    fn new_project_contains_owner_as_member() {
        let owner = Uuid::new_v4();
        let project = Project::new(owner, "Apollo");
        assert!(project.has_member(owner));
        assert_eq!(project.team_member_ids.len(), 1);
    }
}
