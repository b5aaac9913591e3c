use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::{models::TaskComment, Database},
    error::{AppError, Result},
    policy::Actor,
};

use super::tasks::require_task_in_company;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub username: String,
    pub comment: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn add_comment(
    db: &Database,
    actor: &Actor,
    task_id: &str,
    text: &str,
) -> Result<TaskComment> {
    require_task_in_company(db, actor, task_id).await?;

    if text.trim().is_empty() {
        return Err(AppError::Validation("Comment text is required".to_string()));
    }

    let _guard = db.write_guard().await;

    let comment = TaskComment {
        id: super::new_id(),
        task_id: task_id.to_string(),
        user_id: actor.id.clone(),
        comment: text.to_string(),
        is_read: false,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO task_comments (id, task_id, user_id, comment, is_read, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&comment.id)
    .bind(&comment.task_id)
    .bind(&comment.user_id)
    .bind(&comment.comment)
    .bind(comment.is_read)
    .bind(comment.created_at)
    .execute(&db.pool)
    .await?;

    Ok(comment)
}

/// List a task's comments, newest first. Listing marks every comment by
/// another author as read. The flag is per task, not per reader: the first
/// non-author view flips it for everyone, and authors re-reading their own
/// thread are not tracked at all.
pub async fn list_comments(
    db: &Database,
    actor: &Actor,
    task_id: &str,
) -> Result<Vec<CommentView>> {
    require_task_in_company(db, actor, task_id).await?;

    let comments = sqlx::query_as::<_, CommentView>(
        "SELECT tc.id, tc.task_id, tc.user_id, u.username, tc.comment, tc.is_read, tc.created_at \
         FROM task_comments tc \
         JOIN users u ON tc.user_id = u.id \
         WHERE tc.task_id = ? \
         ORDER BY tc.created_at DESC",
    )
    .bind(task_id)
    .fetch_all(&db.pool)
    .await?;

    let _guard = db.write_guard().await;
    sqlx::query("UPDATE task_comments SET is_read = 1 WHERE task_id = ? AND user_id != ?")
        .bind(task_id)
        .bind(&actor.id)
        .execute(&db.pool)
        .await?;

    Ok(comments)
}

/// Unread comments on tasks the actor is responsible for: every task in the
/// company for an Admin, own tasks otherwise. Comments by the actor never
/// count toward their own badge.
pub async fn unread_count(db: &Database, actor: &Actor) -> Result<i64> {
    let count = if actor.is_admin() {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM task_comments tc \
             JOIN tasks t ON tc.task_id = t.id \
             WHERE t.company_id = ? AND tc.user_id != ? AND tc.is_read = 0",
        )
        .bind(&actor.company_id)
        .bind(&actor.id)
        .fetch_one(&db.pool)
        .await?
    } else {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM task_comments tc \
             JOIN tasks t ON tc.task_id = t.id \
             WHERE t.company_id = ? AND t.assigned_to = ? AND tc.user_id != ? AND tc.is_read = 0",
        )
        .bind(&actor.company_id)
        .bind(&actor.id)
        .bind(&actor.id)
        .fetch_one(&db.pool)
        .await?
    };
    Ok(count)
}
