use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::{
        models::{Message, PrivateMessage, Role},
        Database,
    },
    error::{AppError, Result},
    policy::{self, Action, Actor},
};

pub const DEFAULT_FEED_LIMIT: i64 = 50;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MessageView {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub company_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CompanyMessageView {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub company_id: String,
    pub company_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PrivateMessageView {
    pub id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub receiver_id: String,
    pub receiver_username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Append a company-wide message. Posting rides on company membership, the
/// same grant that makes the feed visible.
pub async fn post_company_message(db: &Database, actor: &Actor, text: &str) -> Result<Message> {
    policy::require(actor, Action::ViewCompanyMessages)?;

    if text.trim().is_empty() {
        return Err(AppError::Validation("Message text is required".to_string()));
    }

    let _guard = db.write_guard().await;

    let message = Message {
        id: super::new_id(),
        user_id: actor.id.clone(),
        company_id: actor.company_id.clone(),
        message: text.to_string(),
        timestamp: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO messages (id, user_id, company_id, message, timestamp) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&message.id)
    .bind(&message.user_id)
    .bind(&message.company_id)
    .bind(&message.message)
    .bind(message.timestamp)
    .execute(&db.pool)
    .await?;

    Ok(message)
}

/// The actor's company feed in chronological order. Storage order is
/// newest-first for the LIMIT window, reversed back for display.
pub async fn list_company_messages(
    db: &Database,
    actor: &Actor,
    limit: i64,
) -> Result<Vec<MessageView>> {
    policy::require(actor, Action::ViewCompanyMessages)?;

    let mut messages = sqlx::query_as::<_, MessageView>(
        "SELECT m.id, m.user_id, u.username, m.company_id, m.message, m.timestamp \
         FROM messages m \
         JOIN users u ON m.user_id = u.id \
         WHERE m.company_id = ? \
         ORDER BY m.timestamp DESC \
         LIMIT ?",
    )
    .bind(&actor.company_id)
    .bind(limit)
    .fetch_all(&db.pool)
    .await?;
    messages.reverse();
    Ok(messages)
}

/// Admin-wide view over every company's broadcast log.
pub async fn list_all_messages(
    db: &Database,
    actor: &Actor,
    limit: i64,
) -> Result<Vec<CompanyMessageView>> {
    policy::require(actor, Action::ViewAllMessages)?;

    let mut messages = sqlx::query_as::<_, CompanyMessageView>(
        "SELECT m.id, m.user_id, u.username, m.company_id, c.name AS company_name, m.message, m.timestamp \
         FROM messages m \
         JOIN users u ON m.user_id = u.id \
         JOIN companies c ON m.company_id = c.id \
         ORDER BY m.timestamp DESC \
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&db.pool)
    .await?;
    messages.reverse();
    Ok(messages)
}

pub async fn post_private_message(
    db: &Database,
    actor: &Actor,
    receiver_id: &str,
    text: &str,
) -> Result<PrivateMessage> {
    policy::require(actor, Action::SendPrivateMessage)?;

    if text.trim().is_empty() {
        return Err(AppError::Validation("Message text is required".to_string()));
    }
    if receiver_id == actor.id {
        return Err(AppError::Validation(
            "Cannot send a message to yourself".to_string(),
        ));
    }

    let _guard = db.write_guard().await;

    let receiver_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(receiver_id)
        .fetch_one(&db.pool)
        .await?;
    if receiver_exists == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let message = PrivateMessage {
        id: super::new_id(),
        sender_id: actor.id.clone(),
        receiver_id: receiver_id.to_string(),
        message: text.to_string(),
        timestamp: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO private_messages (id, sender_id, receiver_id, message, timestamp) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&message.id)
    .bind(&message.sender_id)
    .bind(&message.receiver_id)
    .bind(&message.message)
    .bind(message.timestamp)
    .execute(&db.pool)
    .await?;

    Ok(message)
}

/// The conversation between the actor and one other user, chronological.
/// Non-Admin actors may only open threads whose other party is an Admin;
/// regular users cannot browse each other's conversations with third
/// parties.
pub async fn list_private_thread(
    db: &Database,
    actor: &Actor,
    other_user_id: &str,
    limit: i64,
) -> Result<Vec<PrivateMessageView>> {
    policy::require(actor, Action::SendPrivateMessage)?;

    let other_role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = ?")
        .bind(other_user_id)
        .fetch_optional(&db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !actor.is_admin() && other_role != Role::Admin {
        return Err(AppError::Forbidden(
            "Private threads are only visible to their Admin participant".to_string(),
        ));
    }

    let mut messages = sqlx::query_as::<_, PrivateMessageView>(
        "SELECT pm.id, pm.sender_id, s.username AS sender_username, \
                pm.receiver_id, r.username AS receiver_username, pm.message, pm.timestamp \
         FROM private_messages pm \
         JOIN users s ON pm.sender_id = s.id \
         JOIN users r ON pm.receiver_id = r.id \
         WHERE (pm.sender_id = ? AND pm.receiver_id = ?) \
            OR (pm.sender_id = ? AND pm.receiver_id = ?) \
         ORDER BY pm.timestamp DESC \
         LIMIT ?",
    )
    .bind(&actor.id)
    .bind(other_user_id)
    .bind(other_user_id)
    .bind(&actor.id)
    .bind(limit)
    .fetch_all(&db.pool)
    .await?;
    messages.reverse();
    Ok(messages)
}

/// The actor's private-message feed. Admins see every conversation; everyone
/// else sees only their own exchanges with an Admin.
pub async fn list_private_feed(
    db: &Database,
    actor: &Actor,
    limit: i64,
) -> Result<Vec<PrivateMessageView>> {
    policy::require(actor, Action::SendPrivateMessage)?;

    let mut messages = if actor.is_admin() {
        sqlx::query_as::<_, PrivateMessageView>(
            "SELECT pm.id, pm.sender_id, s.username AS sender_username, \
                    pm.receiver_id, r.username AS receiver_username, pm.message, pm.timestamp \
             FROM private_messages pm \
             JOIN users s ON pm.sender_id = s.id \
             JOIN users r ON pm.receiver_id = r.id \
             ORDER BY pm.timestamp DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&db.pool)
        .await?
    } else {
        sqlx::query_as::<_, PrivateMessageView>(
            "SELECT pm.id, pm.sender_id, s.username AS sender_username, \
                    pm.receiver_id, r.username AS receiver_username, pm.message, pm.timestamp \
             FROM private_messages pm \
             JOIN users s ON pm.sender_id = s.id \
             JOIN users r ON pm.receiver_id = r.id \
             WHERE (pm.sender_id = ? AND r.role = 'Admin') \
                OR (pm.receiver_id = ? AND s.role = 'Admin') \
             ORDER BY pm.timestamp DESC \
             LIMIT ?",
        )
        .bind(&actor.id)
        .bind(&actor.id)
        .bind(limit)
        .fetch_all(&db.pool)
        .await?
    };
    messages.reverse();
    Ok(messages)
}
