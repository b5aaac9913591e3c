use sqlx::sqlite::SqlitePoolOptions;

use taskhive_server::{
    db::{
        models::{Company, Role, User},
        Database,
    },
    policy::Actor,
    repo,
};

/// Fresh in-memory database. A single pooled connection keeps every query on
/// the same in-memory instance.
pub async fn test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    let db = Database::from_pool(pool);
    db.run_migrations().await.expect("run migrations");
    db
}

/// Synthetic Admin identity used to bootstrap fixtures, standing in for the
/// seeded first admin.
pub fn bootstrap_actor() -> Actor {
    Actor {
        id: "bootstrap-admin".to_string(),
        username: "root".to_string(),
        role: Role::Admin,
        company_id: String::new(),
    }
}

pub fn actor_for(user: &User) -> Actor {
    Actor {
        id: user.id.clone(),
        username: user.username.clone(),
        role: user.role,
        company_id: user.company_id.clone(),
    }
}

pub async fn create_company(db: &Database, name: &str) -> Company {
    repo::companies::create_company(db, &bootstrap_actor(), name)
        .await
        .expect("create company")
}

pub async fn create_user(
    db: &Database,
    creator: &Actor,
    username: &str,
    role: Role,
    company_id: &str,
) -> User {
    repo::users::create_user(
        db,
        creator,
        repo::users::NewUser {
            username: username.to_string(),
            password: "correct-horse-battery".to_string(),
            role,
            company_id: company_id.to_string(),
            mobile_number: None,
        },
    )
    .await
    .expect("create user")
}

/// A company with one Admin, one Manager and one Employee, ready to act.
pub async fn company_fixture(
    db: &Database,
    name: &str,
    prefix: &str,
) -> (Company, Actor, Actor, Actor) {
    let company = create_company(db, name).await;
    let bootstrap = bootstrap_actor();
    let admin = create_user(
        db,
        &bootstrap,
        &format!("{prefix}_admin"),
        Role::Admin,
        &company.id,
    )
    .await;
    let admin = actor_for(&admin);
    let manager = create_user(db, &admin, &format!("{prefix}_manager"), Role::Manager, &company.id).await;
    let employee =
        create_user(db, &admin, &format!("{prefix}_employee"), Role::Employee, &company.id).await;
    (company, admin, actor_for(&manager), actor_for(&employee))
}
