use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    auth,
    db::{
        models::{Role, User},
        Database,
    },
    error::{AppError, Result},
    policy::{self, Action, Actor},
};

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub company_id: String,
    pub mobile_number: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserOverview {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub company_id: String,
    pub company_name: String,
    pub is_active: bool,
    pub mobile_number: Option<String>,
}

pub async fn create_user(db: &Database, actor: &Actor, new_user: NewUser) -> Result<User> {
    policy::require(actor, Action::CreateUser)?;

    let username = new_user.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if new_user.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let _guard = db.write_guard().await;

    let company_exists =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies WHERE id = ?")
            .bind(&new_user.company_id)
            .fetch_one(&db.pool)
            .await?;
    if company_exists == 0 {
        return Err(AppError::NotFound("Company not found".to_string()));
    }

    // Usernames are unique across all companies; login is by username alone.
    let taken = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(&db.pool)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let user = User {
        id: super::new_id(),
        username: username.to_string(),
        password_hash: auth::hash_password(&new_user.password)?,
        role: new_user.role,
        company_id: new_user.company_id,
        is_active: true,
        mobile_number: new_user.mobile_number,
        telegram_chat_id: None,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, role, company_id, is_active, mobile_number, telegram_chat_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.company_id)
    .bind(user.is_active)
    .bind(&user.mobile_number)
    .bind(&user.telegram_chat_id)
    .bind(user.created_at)
    .execute(&db.pool)
    .await?;

    Ok(user)
}

/// Verify credentials by username or mobile number. The company the user
/// picked at login must match the one they belong to.
pub async fn authenticate(
    db: &Database,
    identifier: &str,
    password: &str,
    company_id: &str,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE username = ? OR mobile_number = ?",
    )
    .bind(identifier)
    .bind(identifier)
    .fetch_optional(&db.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !auth::verify_password(password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }
    if !user.is_active {
        return Err(AppError::Unauthorized);
    }
    if user.company_id != company_id {
        return Err(AppError::Validation("Invalid company selection".to_string()));
    }

    Ok(user)
}

/// Members of the actor's own company, e.g. for addressing private messages.
pub async fn list_company_users(db: &Database, actor: &Actor) -> Result<Vec<User>> {
    let users =
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE company_id = ? ORDER BY username ASC")
            .bind(&actor.company_id)
            .fetch_all(&db.pool)
            .await?;
    Ok(users)
}

pub async fn list_all_users(db: &Database, actor: &Actor) -> Result<Vec<UserOverview>> {
    policy::require(actor, Action::ManageUsers)?;

    let users = sqlx::query_as::<_, UserOverview>(
        "SELECT u.id, u.username, u.role, u.company_id, c.name AS company_name, u.is_active, u.mobile_number \
         FROM users u \
         JOIN companies c ON u.company_id = c.id \
         ORDER BY c.name ASC, u.username ASC",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(users)
}

pub async fn list_users_in_company(
    db: &Database,
    actor: &Actor,
    company_id: &str,
) -> Result<Vec<User>> {
    policy::require(actor, Action::ManageUsers)?;

    let users =
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE company_id = ? ORDER BY username ASC")
            .bind(company_id)
            .fetch_all(&db.pool)
            .await?;
    Ok(users)
}

pub async fn deactivate_user(db: &Database, actor: &Actor, user_id: &str) -> Result<()> {
    set_active(db, actor, user_id, false).await
}

pub async fn reactivate_user(db: &Database, actor: &Actor, user_id: &str) -> Result<()> {
    set_active(db, actor, user_id, true).await
}

async fn set_active(db: &Database, actor: &Actor, user_id: &str, active: bool) -> Result<()> {
    policy::require(actor, Action::ManageUsers)?;

    if user_id == actor.id {
        return Err(AppError::Validation(
            "Cannot deactivate your own account".to_string(),
        ));
    }

    let _guard = db.write_guard().await;

    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(active)
        .bind(user_id)
        .execute(&db.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}

/// Permanent removal. Refused while the user still has tasks assigned;
/// deactivation is the safe alternative. Otherwise cascades everything the
/// user authored or subscribed to.
pub async fn delete_user(db: &Database, actor: &Actor, user_id: &str) -> Result<()> {
    policy::require(actor, Action::ManageUsers)?;

    if user_id == actor.id {
        return Err(AppError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    let _guard = db.write_guard().await;

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(&db.pool)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let task_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE assigned_to = ?")
            .bind(user_id)
            .fetch_one(&db.pool)
            .await?;
    if task_count > 0 {
        return Err(AppError::HasDependents(
            "Cannot delete user with assigned tasks; deactivate instead".to_string(),
        ));
    }

    let mut tx = db.pool.begin().await?;
    sqlx::query("DELETE FROM task_comments WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM messages WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM private_messages WHERE sender_id = ? OR receiver_id = ?")
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM push_subscriptions WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM notifications WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(())
}

pub async fn set_telegram_chat_id(
    db: &Database,
    actor: &Actor,
    chat_id: Option<String>,
) -> Result<()> {
    let _guard = db.write_guard().await;

    sqlx::query("UPDATE users SET telegram_chat_id = ? WHERE id = ?")
        .bind(&chat_id)
        .bind(&actor.id)
        .execute(&db.pool)
        .await?;
    Ok(())
}

pub async fn set_mobile_number(
    db: &Database,
    actor: &Actor,
    mobile_number: Option<String>,
) -> Result<()> {
    let _guard = db.write_guard().await;

    sqlx::query("UPDATE users SET mobile_number = ? WHERE id = ?")
        .bind(&mobile_number)
        .bind(&actor.id)
        .execute(&db.pool)
        .await?;
    Ok(())
}

/// Internal lookup used by the notification dispatcher.
pub(crate) async fn find_by_id(db: &Database, user_id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(user)
}
