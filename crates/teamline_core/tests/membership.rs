use std::collections::BTreeSet;

use rusqlite::Connection;
use teamline_core::db::open_db_in_memory;
use teamline_core::{
    CoreError, MembershipService, NewUser, ProjectDraft, ProjectPatch, ProjectStore,
    SqliteProjectStore, SqliteUserStore, User, UserService, UserStore,
};
use uuid::Uuid;

fn register(conn: &Connection, username: &str) -> User {
    let service = UserService::new(SqliteUserStore::try_new(conn).unwrap());
    service
        .register(NewUser {
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "Person".to_string(),
            email: format!("{username}@example.com"),
        })
        .unwrap()
}

fn membership(conn: &Connection) -> MembershipService<SqliteUserStore<'_>, SqliteProjectStore<'_>> {
    MembershipService::new(
        SqliteUserStore::try_new(conn).unwrap(),
        SqliteProjectStore::try_new(conn).unwrap(),
    )
}

#[test]
fn create_project_links_owner_on_both_sides() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "frodo");
    let service = membership(&conn);

    let project = service
        .create_project(
            owner.id,
            ProjectDraft {
                title: "Apollo".to_string(),
                ..ProjectDraft::default()
            },
        )
        .unwrap();

    assert_eq!(project.owner_user_id, owner.id);
    assert_eq!(
        project.team_member_ids,
        BTreeSet::from([owner.id]),
        "new project team must be exactly the owner"
    );

    let users = SqliteUserStore::try_new(&conn).unwrap();
    let owner_doc = users.get(owner.id).unwrap().unwrap();
    assert!(owner_doc.project_ids.contains(&project.id));
}

#[test]
fn create_project_with_unknown_owner_fails_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let service = membership(&conn);
    let ghost = Uuid::new_v4();

    let err = service
        .create_project(ghost, ProjectDraft::default())
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[test]
fn delete_project_is_owner_only() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "frodo");
    let other = register(&conn, "samwise");
    let service = membership(&conn);

    let project = service
        .create_project(
            owner.id,
            ProjectDraft {
                title: "Apollo".to_string(),
                ..ProjectDraft::default()
            },
        )
        .unwrap();

    let err = service.delete_project(other.id, project.id).unwrap_err();
    assert!(matches!(err, CoreError::Forbidden { .. }));

    let err = service.delete_project(owner.id, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    service.delete_project(owner.id, project.id).unwrap();
    let projects = SqliteProjectStore::try_new(&conn).unwrap();
    assert!(projects.get(project.id).unwrap().is_none());
}

#[test]
fn replace_team_members_updates_both_sides_of_the_edge() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "frodo");
    let member = register(&conn, "samwise");
    let service = membership(&conn);
    let users = SqliteUserStore::try_new(&conn).unwrap();

    let project = service
        .create_project(
            owner.id,
            ProjectDraft {
                title: "Apollo".to_string(),
                ..ProjectDraft::default()
            },
        )
        .unwrap();

    let expanded = service
        .replace_team_members(owner.id, project.id, BTreeSet::from([owner.id, member.id]))
        .unwrap();
    assert_eq!(
        expanded.team_member_ids,
        BTreeSet::from([owner.id, member.id])
    );
    assert!(users
        .get(member.id)
        .unwrap()
        .unwrap()
        .project_ids
        .contains(&project.id));

    let shrunk = service
        .replace_team_members(owner.id, project.id, BTreeSet::from([owner.id]))
        .unwrap();
    assert_eq!(shrunk.team_member_ids, BTreeSet::from([owner.id]));
    assert!(!users
        .get(member.id)
        .unwrap()
        .unwrap()
        .project_ids
        .contains(&project.id));
}

#[test]
fn owner_membership_cannot_be_revoked_by_replacement() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "frodo");
    let member = register(&conn, "samwise");
    let service = membership(&conn);

    let project = service
        .create_project(
            owner.id,
            ProjectDraft {
                title: "Apollo".to_string(),
                ..ProjectDraft::default()
            },
        )
        .unwrap();

    // Omitting the owner is silently corrected, not an error.
    let updated = service
        .replace_team_members(owner.id, project.id, BTreeSet::from([member.id]))
        .unwrap();
    assert!(updated.team_member_ids.contains(&owner.id));
    assert!(updated.team_member_ids.contains(&member.id));
}

#[test]
fn replace_team_members_rejects_unknown_member_ids() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "frodo");
    let service = membership(&conn);

    let project = service
        .create_project(
            owner.id,
            ProjectDraft {
                title: "Apollo".to_string(),
                ..ProjectDraft::default()
            },
        )
        .unwrap();

    let ghost = Uuid::new_v4();
    let err = service
        .replace_team_members(owner.id, project.id, BTreeSet::from([owner.id, ghost]))
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    let projects = SqliteProjectStore::try_new(&conn).unwrap();
    let unchanged = projects.get(project.id).unwrap().unwrap();
    assert_eq!(unchanged.team_member_ids, BTreeSet::from([owner.id]));
}

#[test]
fn update_project_requires_membership_and_preserves_untouched_fields() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "frodo");
    let outsider = register(&conn, "gollum");
    let service = membership(&conn);

    let project = service
        .create_project(
            owner.id,
            ProjectDraft {
                title: "Apollo".to_string(),
                description: "moon landing".to_string(),
                ..ProjectDraft::default()
            },
        )
        .unwrap();

    let err = service
        .update_project(
            outsider.id,
            project.id,
            ProjectPatch {
                title: Some("Hijacked".to_string()),
                ..ProjectPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden { .. }));

    let updated = service
        .update_project(
            owner.id,
            project.id,
            ProjectPatch {
                title: Some("Artemis".to_string()),
                ..ProjectPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Artemis");
    assert_eq!(updated.description, "moon landing");
    assert_eq!(updated.owner_user_id, owner.id);
}

#[test]
fn projects_for_user_tolerates_a_missing_forward_link() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "frodo");
    let service = membership(&conn);
    let users = SqliteUserStore::try_new(&conn).unwrap();

    let project = service
        .create_project(
            owner.id,
            ProjectDraft {
                title: "Apollo".to_string(),
                ..ProjectDraft::default()
            },
        )
        .unwrap();

    // Simulate a previously applied partial failure: the owner document
    // lost its forward link while the project still lists the member.
    let mut owner_doc = users.get(owner.id).unwrap().unwrap();
    owner_doc.project_ids.remove(&project.id);
    users.save(&owner_doc).unwrap();

    let visible = service.projects_for_user(owner.id).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, project.id);
}

#[test]
fn membership_end_to_end_scenario() {
    let conn = open_db_in_memory().unwrap();
    let u1 = register(&conn, "frodo");
    let u2 = register(&conn, "samwise");
    let service = membership(&conn);
    let users = SqliteUserStore::try_new(&conn).unwrap();
    let projects = SqliteProjectStore::try_new(&conn).unwrap();

    let project = service
        .create_project(
            u1.id,
            ProjectDraft {
                title: "Apollo".to_string(),
                ..ProjectDraft::default()
            },
        )
        .unwrap();
    assert_eq!(project.team_member_ids, BTreeSet::from([u1.id]));
    assert!(users
        .get(u1.id)
        .unwrap()
        .unwrap()
        .project_ids
        .contains(&project.id));

    service
        .replace_team_members(u1.id, project.id, BTreeSet::from([u1.id, u2.id]))
        .unwrap();
    assert!(users
        .get(u2.id)
        .unwrap()
        .unwrap()
        .project_ids
        .contains(&project.id));

    service.delete_project(u1.id, project.id).unwrap();
    assert!(!users
        .get(u1.id)
        .unwrap()
        .unwrap()
        .project_ids
        .contains(&project.id));
    assert!(!users
        .get(u2.id)
        .unwrap()
        .unwrap()
        .project_ids
        .contains(&project.id));
    assert!(projects.get(project.id).unwrap().is_none());
}
