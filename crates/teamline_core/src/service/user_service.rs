//! User use-case service.
//!
//! # Responsibility
//! - Account registration and profile reads/updates.
//!
//! # Invariants
//! - `username` and `email` are unique across the whole store.
//! - `project_ids` is never touched here; membership is owned by the
//!   membership manager.
//!
//! Credentials and sessions are handled outside this crate.

use crate::model::user::{User, UserId};
use crate::model::EntityKind;
use crate::service::{name_conflict_backstop, not_found, uniqueness, CoreResult};
use crate::store::users::UserStore;

/// Fields for a new account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Partial profile update; `None` leaves the field untouched. The
/// username is permanent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Service facade over the user store.
pub struct UserService<U: UserStore> {
    users: U,
}

impl<U: UserStore> UserService<U> {
    /// Creates a service using the provided store implementation.
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Registers a new account; `NameConflict` when the username or email
    /// is already taken.
    pub fn register(&self, new_user: NewUser) -> CoreResult<User> {
        let user = User::new(
            new_user.username,
            new_user.first_name,
            new_user.last_name,
            new_user.email,
        );
        user.validate()?;

        uniqueness::check_create(EntityKind::User, None, &user.username, |candidate| {
            Ok(self
                .users
                .find_by_username(candidate)?
                .map(|existing| existing.id))
        })?;
        uniqueness::check_create(EntityKind::User, None, &user.email, |candidate| {
            Ok(self
                .users
                .find_by_email(candidate)?
                .map(|existing| existing.id))
        })?;

        let username = user.username.clone();
        self.users
            .save(&user)
            .map_err(|err| name_conflict_backstop(EntityKind::User, None, &username, err))?;
        Ok(user)
    }

    /// Gets one account by id.
    pub fn get_user(&self, user_id: UserId) -> CoreResult<User> {
        self.users
            .get(user_id)?
            .ok_or_else(|| not_found(EntityKind::User, user_id))
    }

    /// All accounts sorted by username.
    pub fn list_users(&self) -> CoreResult<Vec<User>> {
        Ok(self.users.list_all()?)
    }

    /// Usernames starting with `prefix`.
    pub fn search_usernames(&self, prefix: &str) -> CoreResult<Vec<String>> {
        Ok(self.users.search_usernames(prefix)?)
    }

    /// Updates profile fields; a changed email is re-checked for
    /// uniqueness with self-exclusion.
    pub fn update_profile(&self, user_id: UserId, patch: ProfilePatch) -> CoreResult<User> {
        let mut user = self
            .users
            .get(user_id)?
            .ok_or_else(|| not_found(EntityKind::User, user_id))?;

        if let Some(first_name) = patch.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = patch.email {
            uniqueness::check_rename(EntityKind::User, None, &email, user_id, |candidate| {
                Ok(self
                    .users
                    .find_by_email(candidate)?
                    .map(|existing| existing.id))
            })?;
            user.email = email;
        }
        user.validate()?;

        let email = user.email.clone();
        self.users
            .save(&user)
            .map_err(|err| name_conflict_backstop(EntityKind::User, None, &email, err))?;
        Ok(user)
    }
}
