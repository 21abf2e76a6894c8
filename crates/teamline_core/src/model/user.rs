//! User domain model.
//!
//! # Invariants
//! - `username` and `email` are unique across the whole store (enforced by
//!   the user service, not here).
//! - `project_ids` mirrors `Project::team_member_ids`; it is mutated only
//!   through the membership manager.

use crate::model::project::ProjectId;
use crate::model::{require_length, require_non_blank, EntityKind, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable user identifier.
pub type UserId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 10;

/// Account document. Credentials are handled outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global id.
    pub id: UserId,
    /// Unique handle, 3..=10 chars.
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Unique contact address, format-checked.
    pub email: String,
    /// Projects this user owns or belongs to (denormalized edge).
    pub project_ids: BTreeSet<ProjectId>,
}

impl User {
    /// Creates a user with a generated id and no project memberships.
    pub fn new(
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            project_ids: BTreeSet::new(),
        }
    }

    /// Checks field formats. Store write paths call this before persisting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(EntityKind::User, "username", &self.username)?;
        require_length(EntityKind::User, "username", &self.username, NAME_MIN, NAME_MAX)?;
        require_non_blank(EntityKind::User, "first_name", &self.first_name)?;
        require_length(
            EntityKind::User,
            "first_name",
            &self.first_name,
            NAME_MIN,
            NAME_MAX,
        )?;
        require_non_blank(EntityKind::User, "last_name", &self.last_name)?;
        require_length(
            EntityKind::User,
            "last_name",
            &self.last_name,
            NAME_MIN,
            NAME_MAX,
        )?;
        require_non_blank(EntityKind::User, "email", &self.email)?;
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::User;
    use crate::model::ValidationError;

    #[test]
    fn valid_user_passes_validation() {
        let user = User::new("frodo", "Frodo", "Baggins", "frodo@shire.me");
        assert!(user.validate().is_ok());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let user = User::new("frodo", "Frodo", "Baggins", "not-an-email");
        assert!(matches!(
            user.validate().unwrap_err(),
            ValidationError::InvalidEmail(_)
        ));
    }

    #[test]
    fn username_length_bounds_are_enforced() {
        let short = User::new("ab", "Frodo", "Baggins", "frodo@shire.me");
        assert!(matches!(
            short.validate().unwrap_err(),
            ValidationError::FieldLength { field: "username", .. }
        ));
    }
}
