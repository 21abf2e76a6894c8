use rusqlite::Connection;
use teamline_core::db::open_db_in_memory;
use teamline_core::{
    CoreError, Label, LabelService, LabelStore, SqliteLabelStore, SqliteStatusStore, StatusService,
};
use uuid::Uuid;

fn labels(conn: &Connection) -> LabelService<SqliteLabelStore<'_>> {
    LabelService::new(SqliteLabelStore::try_new(conn).unwrap())
}

fn statuses(conn: &Connection) -> StatusService<SqliteStatusStore<'_>> {
    StatusService::new(SqliteStatusStore::try_new(conn).unwrap())
}

#[test]
fn duplicate_label_name_in_one_project_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let project_id = Uuid::new_v4();
    let service = labels(&conn);

    service.create_label(project_id, "Bug", "#d73a4a").unwrap();
    let err = service
        .create_label(project_id, "Bug", "#fbca04")
        .unwrap_err();
    assert!(matches!(err, CoreError::NameConflict { .. }));
}

#[test]
fn label_names_are_isolated_per_project() {
    let conn = open_db_in_memory().unwrap();
    let p1 = Uuid::new_v4();
    let p2 = Uuid::new_v4();
    let service = labels(&conn);

    service.create_label(p1, "Bug", "#d73a4a").unwrap();
    service.create_label(p2, "Bug", "#d73a4a").unwrap();

    assert_eq!(service.list_labels(p1).unwrap().len(), 1);
    assert_eq!(service.list_labels(p2).unwrap().len(), 1);
}

#[test]
fn name_comparison_is_case_sensitive_exact_match() {
    let conn = open_db_in_memory().unwrap();
    let project_id = Uuid::new_v4();
    let service = labels(&conn);

    service.create_label(project_id, "Bug", "#d73a4a").unwrap();
    service.create_label(project_id, "bug", "#d73a4a").unwrap();
    assert_eq!(service.list_labels(project_id).unwrap().len(), 2);
}

#[test]
fn renaming_a_status_to_its_own_name_is_not_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let project_id = Uuid::new_v4();
    let service = statuses(&conn);

    let open = service.create_status(project_id, "Open", "#0e8a16").unwrap();
    let renamed = service
        .update_status(project_id, open.id, "Open", "#ededed")
        .unwrap();
    assert_eq!(renamed.name, "Open");
    assert_eq!(renamed.color, "#ededed");
}

#[test]
fn renaming_to_a_taken_name_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let project_id = Uuid::new_v4();
    let service = statuses(&conn);

    service.create_status(project_id, "Open", "#0e8a16").unwrap();
    let done = service.create_status(project_id, "Done", "#5319e7").unwrap();

    let err = service
        .update_status(project_id, done.id, "Open", "#5319e7")
        .unwrap_err();
    assert!(matches!(err, CoreError::NameConflict { .. }));
}

#[test]
fn catalog_operations_guard_project_scope() {
    let conn = open_db_in_memory().unwrap();
    let project_id = Uuid::new_v4();
    let other_project = Uuid::new_v4();
    let service = labels(&conn);

    let label = service.create_label(project_id, "Bug", "#d73a4a").unwrap();

    assert!(service.get_label(other_project, label.id).unwrap().is_none());

    let err = service
        .update_label(other_project, label.id, "Feature", "#a2eeef")
        .unwrap_err();
    assert!(matches!(err, CoreError::ProjectMismatch { .. }));

    let err = service.delete_label(other_project, label.id).unwrap_err();
    assert!(matches!(err, CoreError::ProjectMismatch { .. }));

    service.delete_label(project_id, label.id).unwrap();
    assert!(service.get_label(project_id, label.id).unwrap().is_none());
}

#[test]
fn invalid_color_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let project_id = Uuid::new_v4();
    let service = labels(&conn);

    let err = service
        .create_label(project_id, "Bug", "crimson")
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(service.list_labels(project_id).unwrap().is_empty());
}

#[test]
fn store_unique_index_backs_up_the_name_pre_check() {
    let conn = open_db_in_memory().unwrap();
    let project_id = Uuid::new_v4();
    let store = SqliteLabelStore::try_new(&conn).unwrap();

    // Bypass the service pre-check, as a lost check-then-act race would.
    store.save(&Label::new(project_id, "Bug", "#d73a4a")).unwrap();
    let err = store
        .save(&Label::new(project_id, "Bug", "#fbca04"))
        .unwrap_err();
    assert!(err.is_unique_violation());
}
