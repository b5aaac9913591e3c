mod common;

use taskhive_server::{
    db::models::{Role, TaskStatus},
    error::AppError,
    repo::{self, tasks::NewTask},
};

use common::*;

#[tokio::test]
async fn deleting_a_user_with_tasks_is_blocked_until_reassignment() {
    let db = test_db().await;
    let (_, admin, _, carol) = company_fixture(&db, "Acme", "acme").await;

    let task = repo::tasks::assign_task(
        &db,
        &admin,
        NewTask {
            title: "Inventory".to_string(),
            description: String::new(),
            assigned_to: carol.id.clone(),
            start_date: None,
            deadline: None,
            priority: None,
        },
    )
    .await
    .unwrap();

    repo::comments::add_comment(&db, &carol, &task.id, "on it")
        .await
        .unwrap();
    repo::messages::post_company_message(&db, &carol, "hello all")
        .await
        .unwrap();
    repo::messages::post_private_message(&db, &carol, &admin.id, "question")
        .await
        .unwrap();

    let err = repo::users::delete_user(&db, &admin, &carol.id).await.unwrap_err();
    assert!(matches!(err, AppError::HasDependents(_)), "{err:?}");

    // Clearing the dependent task unblocks deletion, which then cascades
    // everything the user left behind.
    repo::tasks::admin_delete_task(&db, &admin, &task.id).await.unwrap();
    repo::users::delete_user(&db, &admin, &carol.id).await.unwrap();

    for (table, column) in [
        ("task_comments", "user_id"),
        ("messages", "user_id"),
        ("private_messages", "sender_id"),
        ("notifications", "user_id"),
        ("push_subscriptions", "user_id"),
    ] {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {table} WHERE {column} = ?"
        ))
        .bind(&carol.id)
        .fetch_one(&db.pool)
        .await
        .unwrap();
        assert_eq!(count, 0, "{table} not cascaded");
    }

    let err = repo::users::deactivate_user(&db, &admin, &carol.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn admins_cannot_remove_themselves() {
    let db = test_db().await;
    let (_, admin, _, _) = company_fixture(&db, "Acme", "acme").await;

    let err = repo::users::delete_user(&db, &admin, &admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err:?}");
    let err = repo::users::deactivate_user(&db, &admin, &admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn deactivated_users_cannot_log_in() {
    let db = test_db().await;
    let (company, admin, manager, _) = company_fixture(&db, "Acme", "acme").await;

    let user = repo::users::authenticate(&db, &manager.username, "correct-horse-battery", &company.id)
        .await
        .unwrap();
    assert_eq!(user.id, manager.id);

    repo::users::deactivate_user(&db, &admin, &manager.id).await.unwrap();
    let err = repo::users::authenticate(&db, &manager.username, "correct-horse-battery", &company.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized), "{err:?}");

    repo::users::reactivate_user(&db, &admin, &manager.id).await.unwrap();
    repo::users::authenticate(&db, &manager.username, "correct-horse-battery", &company.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn login_requires_the_right_company_and_credentials() {
    let db = test_db().await;
    let (_, _, manager, _) = company_fixture(&db, "Acme", "acme").await;
    let (globex, _, _, _) = company_fixture(&db, "Globex", "globex").await;

    let err = repo::users::authenticate(&db, &manager.username, "correct-horse-battery", &globex.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err:?}");

    let err = repo::users::authenticate(&db, &manager.username, "wrong-password", &manager.company_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized), "{err:?}");

    let err = repo::users::authenticate(&db, "nobody", "whatever-pass", &manager.company_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized), "{err:?}");
}

#[tokio::test]
async fn login_by_mobile_number() {
    let db = test_db().await;
    let (company, admin, _, _) = company_fixture(&db, "Acme", "acme").await;

    repo::users::create_user(
        &db,
        &admin,
        repo::users::NewUser {
            username: "dana".to_string(),
            password: "correct-horse-battery".to_string(),
            role: Role::Employee,
            company_id: company.id.clone(),
            mobile_number: Some("+15550100".to_string()),
        },
    )
    .await
    .unwrap();

    let user = repo::users::authenticate(&db, "+15550100", "correct-horse-battery", &company.id)
        .await
        .unwrap();
    assert_eq!(user.username, "dana");
}

#[tokio::test]
async fn completed_work_does_not_block_deactivation() {
    let db = test_db().await;
    let (_, admin, _, employee) = company_fixture(&db, "Acme", "acme").await;

    let task = repo::tasks::assign_task(
        &db,
        &admin,
        NewTask {
            title: "Wrap up".to_string(),
            description: String::new(),
            assigned_to: employee.id.clone(),
            start_date: None,
            deadline: None,
            priority: None,
        },
    )
    .await
    .unwrap();
    repo::tasks::update_own_status(&db, &employee, &task.id, TaskStatus::Completed)
        .await
        .unwrap();

    // Deletion is still blocked by the assigned task, deactivation is the
    // sanctioned alternative.
    let err = repo::users::delete_user(&db, &admin, &employee.id).await.unwrap_err();
    assert!(matches!(err, AppError::HasDependents(_)), "{err:?}");
    repo::users::deactivate_user(&db, &admin, &employee.id).await.unwrap();
}
