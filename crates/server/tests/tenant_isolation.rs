mod common;

use taskhive_server::{
    db::models::{Role, TaskStatus},
    error::AppError,
    repo::{self, tasks::NewTask, tasks::TaskUpdate},
};

use common::*;

fn new_task(title: &str, assignee: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: String::new(),
        assigned_to: assignee.to_string(),
        start_date: None,
        deadline: None,
        priority: None,
    }
}

#[tokio::test]
async fn cross_tenant_task_access_reads_as_missing() {
    let db = test_db().await;
    let (_, acme_admin, acme_manager, _) = company_fixture(&db, "Acme", "acme").await;
    let (_, globex_admin, _, globex_employee) = company_fixture(&db, "Globex", "globex").await;

    let task = repo::tasks::assign_task(&db, &acme_admin, new_task("Ship v1", &acme_manager.id))
        .await
        .unwrap();

    // Every operation from the other tenant reports the task as missing,
    // never as forbidden.
    let err = repo::tasks::get_task(&db, &globex_employee, &task.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let err = repo::tasks::update_own_status(&db, &globex_employee, &task.id, TaskStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let err = repo::tasks::admin_update_task(&db, &globex_admin, &task.id, TaskUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let err = repo::tasks::admin_delete_task(&db, &globex_admin, &task.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let err = repo::comments::list_comments(&db, &globex_employee, &task.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let err = repo::attachments::list_attachments(&db, &globex_employee, &task.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    // The task is untouched.
    let task = repo::tasks::get_task(&db, &acme_manager, &task.id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
}

#[tokio::test]
async fn cross_tenant_assignment_is_rejected() {
    let db = test_db().await;
    let (_, acme_admin, _, _) = company_fixture(&db, "Acme", "acme").await;
    let (_, _, globex_manager, _) = company_fixture(&db, "Globex", "globex").await;

    let err = repo::tasks::assign_task(&db, &acme_admin, new_task("Espionage", &globex_manager.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn admin_cannot_reassign_across_tenants() {
    let db = test_db().await;
    let (_, acme_admin, acme_manager, _) = company_fixture(&db, "Acme", "acme").await;
    let (_, _, _, globex_employee) = company_fixture(&db, "Globex", "globex").await;

    let task = repo::tasks::assign_task(&db, &acme_admin, new_task("Ship v1", &acme_manager.id))
        .await
        .unwrap();

    let update = TaskUpdate {
        assigned_to: Some(globex_employee.id.clone()),
        ..TaskUpdate::default()
    };
    let err = repo::tasks::admin_update_task(&db, &acme_admin, &task.id, update)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let task = repo::tasks::get_task(&db, &acme_admin, &task.id).await.unwrap();
    assert_eq!(task.assigned_to, acme_manager.id);
}

#[tokio::test]
async fn company_cap_is_seven() {
    let db = test_db().await;
    for i in 1..=7 {
        create_company(&db, &format!("Company {i}")).await;
    }

    let err = repo::companies::create_company(&db, &bootstrap_actor(), "Company 8")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LimitExceeded(_)), "{err:?}");

    let companies = repo::companies::list_companies(&db).await.unwrap();
    assert_eq!(companies.len(), 7);
}

#[tokio::test]
async fn duplicate_names_conflict() {
    let db = test_db().await;
    let (_, admin, _, _) = company_fixture(&db, "Acme", "acme").await;

    let err = repo::companies::create_company(&db, &bootstrap_actor(), "Acme")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    // Usernames are globally unique, even across companies.
    let other = create_company(&db, "Globex").await;
    let err = repo::users::create_user(
        &db,
        &admin,
        repo::users::NewUser {
            username: "acme_manager".to_string(),
            password: "another-password".to_string(),
            role: Role::Employee,
            company_id: other.id.clone(),
            mobile_number: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
}

#[tokio::test]
async fn non_admin_roles_are_denied_admin_operations() {
    let db = test_db().await;
    let (company, _, manager, employee) = company_fixture(&db, "Acme", "acme").await;

    for actor in [&manager, &employee] {
        let err = repo::companies::create_company(&db, actor, "Initech")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized), "{err:?}");

        let err = repo::tasks::assign_task(&db, actor, new_task("Nope", &employee.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized), "{err:?}");

        let err = repo::tasks::list_company_tasks(&db, actor).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized), "{err:?}");

        let err = repo::users::create_user(
            &db,
            actor,
            repo::users::NewUser {
                username: "intruder".to_string(),
                password: "long-enough-pass".to_string(),
                role: Role::Employee,
                company_id: company.id.clone(),
                mobile_number: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized), "{err:?}");
    }
}
