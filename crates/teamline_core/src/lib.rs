//! Core domain logic for Teamline.
//! This crate is the single source of truth for the invariants that span
//! documents in a store with single-document atomicity only: membership
//! edges stay symmetric on both sides, dependency edges never outlive
//! their target, and names stay unique within their scope.

pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::label::{Label, LabelId};
pub use model::project::{Project, ProjectId};
pub use model::status::{Status, StatusId};
pub use model::task::{Task, TaskId};
pub use model::user::{User, UserId};
pub use model::{EntityKind, ValidationError};
pub use service::coordinator::{PartialFailureReport, RetryPolicy};
pub use service::dependency::DependencyService;
pub use service::label_service::LabelService;
pub use service::membership::{MembershipService, ProjectDraft, ProjectPatch};
pub use service::status_service::StatusService;
pub use service::task_service::{TaskDraft, TaskPatch, TaskService};
pub use service::user_service::{NewUser, ProfilePatch, UserService};
pub use service::{CoreError, CoreResult};
pub use store::catalog::{LabelStore, SqliteLabelStore, SqliteStatusStore, StatusStore};
pub use store::projects::{ProjectStore, SqliteProjectStore};
pub use store::tasks::{SqliteTaskStore, TaskStore};
pub use store::users::{SqliteUserStore, UserStore};
pub use store::{StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
