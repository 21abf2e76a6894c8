//! Core use-case services.
//!
//! # Responsibility
//! - Keep the denormalized cross-document relationships consistent
//!   (membership edges, dependency edges, scoped name uniqueness).
//! - Orchestrate store calls into use-case level APIs.
//!
//! # Invariants
//! - Deterministic validation failures are raised before any write.
//! - Multi-document writes go through the integrity coordinator; nothing
//!   in this layer assumes cross-document atomicity.

use crate::model::project::ProjectId;
use crate::model::task::TaskId;
use crate::model::{EntityKind, ValidationError};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod coordinator;
pub mod dependency;
pub mod label_service;
pub mod membership;
pub mod status_service;
pub mod task_service;
pub mod uniqueness;
pub mod user_service;

use coordinator::{PartialFailureReport, SequenceError};

pub type CoreResult<T> = Result<T, CoreError>;

/// Service-layer error surfaced to callers of the core.
#[derive(Debug)]
pub enum CoreError {
    /// Referenced entity is absent.
    NotFound { entity: EntityKind, id: Uuid },
    /// Requester failed an ownership or membership check.
    Forbidden { detail: String },
    /// Name uniqueness violated within its scope (`None` = global scope).
    NameConflict {
        entity: EntityKind,
        name: String,
        scope: Option<ProjectId>,
    },
    /// Task cannot depend on itself.
    SelfDependency(TaskId),
    /// Entity exists but belongs to a different project than supplied.
    ProjectMismatch {
        entity: EntityKind,
        id: Uuid,
        project_id: ProjectId,
    },
    /// A multi-step write completed some but not all of its writes.
    PartialFailure(PartialFailureReport),
    /// Field validation failure (detected before any write).
    Validation(ValidationError),
    /// Store transport failure outside the kinds above.
    Store(StoreError),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Forbidden { detail } => write!(f, "forbidden: {detail}"),
            Self::NameConflict {
                entity,
                name,
                scope,
            } => match scope {
                Some(project_id) => write!(
                    f,
                    "{entity} name `{name}` already exists in project {project_id}"
                ),
                None => write!(f, "{entity} `{name}` already exists"),
            },
            Self::SelfDependency(task_id) => {
                write!(f, "task {task_id} cannot depend on itself")
            }
            Self::ProjectMismatch {
                entity,
                id,
                project_id,
            } => write!(f, "{entity} {id} does not belong to project {project_id}"),
            Self::PartialFailure(report) => write!(f, "{report}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::PartialFailure(report) => Some(&report.cause),
            _ => None,
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CoreError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Store(other),
        }
    }
}

impl From<SequenceError> for CoreError {
    fn from(value: SequenceError) -> Self {
        match value {
            SequenceError::Aborted { cause, .. } => cause.into(),
            SequenceError::Partial(report) => Self::PartialFailure(report),
        }
    }
}

pub(crate) fn not_found(entity: EntityKind, id: Uuid) -> CoreError {
    CoreError::NotFound { entity, id }
}

/// Maps a lost uniqueness race (store-level unique index violation) back to
/// the `NameConflict` the pre-check would have produced.
pub(crate) fn name_conflict_backstop(
    entity: EntityKind,
    scope: Option<ProjectId>,
    name: &str,
    err: StoreError,
) -> CoreError {
    if err.is_unique_violation() {
        return CoreError::NameConflict {
            entity,
            name: name.to_string(),
            scope,
        };
    }
    err.into()
}
