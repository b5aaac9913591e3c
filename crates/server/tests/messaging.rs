mod common;

use taskhive_server::{
    error::AppError,
    repo::{self, tasks::NewTask},
};

use common::*;

#[tokio::test]
async fn company_feeds_are_isolated_and_chronological() {
    let db = test_db().await;
    let (_, _, acme_manager, acme_employee) = company_fixture(&db, "Acme", "acme").await;
    let (_, _, globex_manager, _) = company_fixture(&db, "Globex", "globex").await;

    repo::messages::post_company_message(&db, &acme_manager, "first")
        .await
        .unwrap();
    repo::messages::post_company_message(&db, &acme_employee, "second")
        .await
        .unwrap();
    repo::messages::post_company_message(&db, &globex_manager, "other company")
        .await
        .unwrap();

    let feed = repo::messages::list_company_messages(&db, &acme_employee, 50)
        .await
        .unwrap();
    let texts: Vec<_> = feed.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);

    let feed = repo::messages::list_company_messages(&db, &globex_manager, 50)
        .await
        .unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].message, "other company");
}

#[tokio::test]
async fn feed_limit_keeps_the_newest_messages() {
    let db = test_db().await;
    let (_, _, manager, _) = company_fixture(&db, "Acme", "acme").await;

    for i in 0..5 {
        repo::messages::post_company_message(&db, &manager, &format!("msg {i}"))
            .await
            .unwrap();
    }

    // The window holds the newest three, displayed oldest-first.
    let feed = repo::messages::list_company_messages(&db, &manager, 3).await.unwrap();
    let texts: Vec<_> = feed.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["msg 2", "msg 3", "msg 4"]);
}

#[tokio::test]
async fn private_threads_require_an_admin_participant() {
    let db = test_db().await;
    let (_, admin, manager, employee) = company_fixture(&db, "Acme", "acme").await;

    repo::messages::post_private_message(&db, &employee, &admin.id, "hello admin")
        .await
        .unwrap();
    repo::messages::post_private_message(&db, &admin, &employee.id, "hello back")
        .await
        .unwrap();
    repo::messages::post_private_message(&db, &manager, &employee.id, "psst")
        .await
        .unwrap();

    // The employee can read the admin conversation from either side.
    let thread = repo::messages::list_private_thread(&db, &employee, &admin.id, 50)
        .await
        .unwrap();
    let texts: Vec<_> = thread.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["hello admin", "hello back"]);

    // But not a peer thread, even one they participate in.
    let err = repo::messages::list_private_thread(&db, &employee, &manager.id, 50)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    // Admins can open anything.
    let thread = repo::messages::list_private_thread(&db, &admin, &employee.id, 50)
        .await
        .unwrap();
    assert_eq!(thread.len(), 2);
}

#[tokio::test]
async fn private_feed_filters_by_admin_involvement() {
    let db = test_db().await;
    let (_, admin, manager, employee) = company_fixture(&db, "Acme", "acme").await;

    repo::messages::post_private_message(&db, &employee, &admin.id, "to admin")
        .await
        .unwrap();
    repo::messages::post_private_message(&db, &manager, &employee.id, "peer chat")
        .await
        .unwrap();

    let feed = repo::messages::list_private_feed(&db, &employee, 50).await.unwrap();
    let texts: Vec<_> = feed.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["to admin"]);

    // The admin-wide feed sees the peer conversation too.
    let feed = repo::messages::list_private_feed(&db, &admin, 50).await.unwrap();
    assert_eq!(feed.len(), 2);
}

#[tokio::test]
async fn messaging_unknown_users_reads_as_missing() {
    let db = test_db().await;
    let (_, _, manager, _) = company_fixture(&db, "Acme", "acme").await;

    let err = repo::messages::post_private_message(&db, &manager, "no-such-user", "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let err = repo::messages::list_private_thread(&db, &manager, "no-such-user", 50)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn comment_read_flag_is_per_task_not_per_reader() {
    let db = test_db().await;
    let (_, admin, alice, bob) = company_fixture(&db, "Acme", "acme").await;

    let task = repo::tasks::assign_task(
        &db,
        &admin,
        NewTask {
            title: "Ship v1".to_string(),
            description: String::new(),
            assigned_to: alice.id.clone(),
            start_date: None,
            deadline: None,
            priority: None,
        },
    )
    .await
    .unwrap();

    repo::comments::add_comment(&db, &admin, &task.id, "status please")
        .await
        .unwrap();

    assert_eq!(repo::comments::unread_count(&db, &alice).await.unwrap(), 1);
    // The author's own badge never counts their comment.
    assert_eq!(repo::comments::unread_count(&db, &admin).await.unwrap(), 0);

    // Any non-author viewing flips the flag for everyone; a later viewer
    // finds nothing unread.
    let comments = repo::comments::list_comments(&db, &bob, &task.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(repo::comments::unread_count(&db, &alice).await.unwrap(), 0);

    // The admin replying makes it unread for the others again, but listing
    // by the author leaves their own comment untouched.
    repo::comments::add_comment(&db, &alice, &task.id, "done").await.unwrap();
    assert_eq!(repo::comments::unread_count(&db, &admin).await.unwrap(), 1);
    let _ = repo::comments::list_comments(&db, &alice, &task.id).await.unwrap();
    assert_eq!(repo::comments::unread_count(&db, &admin).await.unwrap(), 1);
}
