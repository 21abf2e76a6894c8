//! Scoped name uniqueness validator.
//!
//! # Responsibility
//! - Decide whether a candidate `(name, scope)` pair may be inserted or
//!   renamed, before the caller writes anything.
//!
//! # Invariants
//! - Comparison is an exact, case-sensitive string match; no folding or
//!   trimming beyond what the caller already performed.
//! - Pure read-then-decide: no side effects.
//!
//! The check and the subsequent write are not atomic; two concurrent
//! creates can both pass. The store schema's unique indexes are the
//! backstop for that race (`name_conflict_backstop` maps the violation).

use crate::model::project::ProjectId;
use crate::model::EntityKind;
use crate::service::{CoreError, CoreResult};
use crate::store::StoreResult;
use uuid::Uuid;

/// Fails with `NameConflict` when `name` is already taken in the scope.
///
/// `find_id` resolves `name` to the id of an existing entity within the
/// caller's scope (`scope` is carried only for error reporting; `None`
/// means globally scoped).
pub fn check_create<F>(
    entity: EntityKind,
    scope: Option<ProjectId>,
    name: &str,
    find_id: F,
) -> CoreResult<()>
where
    F: FnOnce(&str) -> StoreResult<Option<Uuid>>,
{
    if find_id(name)?.is_some() {
        return Err(CoreError::NameConflict {
            entity,
            name: name.to_string(),
            scope,
        });
    }
    Ok(())
}

/// Same check, but a match on `exclude_id` is permitted: renaming an
/// entity to its own current name is not a conflict.
pub fn check_rename<F>(
    entity: EntityKind,
    scope: Option<ProjectId>,
    name: &str,
    exclude_id: Uuid,
    find_id: F,
) -> CoreResult<()>
where
    F: FnOnce(&str) -> StoreResult<Option<Uuid>>,
{
    match find_id(name)? {
        Some(existing) if existing != exclude_id => Err(CoreError::NameConflict {
            entity,
            name: name.to_string(),
            scope,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{check_create, check_rename};
    use crate::model::EntityKind;
    use crate::service::CoreError;
    use uuid::Uuid;

    #[test]
    fn check_create_rejects_taken_name() {
        let taken = Uuid::new_v4();
        let err = check_create(EntityKind::Label, None, "Bug", |_| Ok(Some(taken))).unwrap_err();
        assert!(matches!(err, CoreError::NameConflict { .. }));
    }

    #[test]
    fn check_create_accepts_free_name() {
        assert!(check_create(EntityKind::Label, None, "Bug", |_| Ok(None)).is_ok());
    }

    #[test]
    fn check_rename_permits_own_current_name() {
        let own = Uuid::new_v4();
        assert!(check_rename(EntityKind::Status, None, "Open", own, |_| Ok(Some(own))).is_ok());
    }

    #[test]
    fn check_rename_rejects_other_entity_name() {
        let other = Uuid::new_v4();
        let err = check_rename(EntityKind::Status, None, "Open", Uuid::new_v4(), |_| {
            Ok(Some(other))
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::NameConflict { .. }));
    }
}
