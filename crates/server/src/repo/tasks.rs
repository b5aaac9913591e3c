use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        models::{Task, TaskPriority, TaskStatus},
        Database,
    },
    error::{AppError, Result},
    lifecycle,
    policy::{self, Action, Actor},
};

#[derive(Debug, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
}

/// Partial update applied by an Admin. Absent fields are left untouched;
/// present fields are written. There is no "explicitly cleared" state.
#[derive(Debug, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
}

/// Task row joined with its assignee's username for display.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TaskOverview {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub assignee_username: String,
    pub company_id: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub by_priority: PriorityStats,
}

#[derive(Debug, Serialize)]
pub struct PriorityStats {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

pub async fn assign_task(db: &Database, actor: &Actor, new_task: NewTask) -> Result<Task> {
    policy::require(actor, Action::AssignTask)?;

    let title = new_task.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Task title is required".to_string()));
    }

    let _guard = db.write_guard().await;

    // The assignee must belong to the admin's own company. A foreign or
    // unknown assignee is reported identically, so nothing leaks.
    let assignee_company =
        sqlx::query_scalar::<_, String>("SELECT company_id FROM users WHERE id = ?")
            .bind(&new_task.assigned_to)
            .fetch_optional(&db.pool)
            .await?;
    if assignee_company.as_deref() != Some(actor.company_id.as_str()) {
        return Err(AppError::NotFound("Assignee not found".to_string()));
    }

    let now = Utc::now();
    let task = Task {
        id: super::new_id(),
        title: title.to_string(),
        description: new_task.description,
        assigned_to: new_task.assigned_to,
        company_id: actor.company_id.clone(),
        status: TaskStatus::Pending,
        priority: new_task.priority.unwrap_or(TaskPriority::Medium),
        start_date: new_task.start_date,
        deadline: new_task.deadline,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO tasks (id, title, description, assigned_to, company_id, status, priority, start_date, deadline, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.assigned_to)
    .bind(&task.company_id)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.start_date)
    .bind(task.deadline)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(&db.pool)
    .await?;

    Ok(task)
}

/// All tasks in the admin's company, deadline-first (tasks without a deadline
/// sort last).
pub async fn list_company_tasks(db: &Database, actor: &Actor) -> Result<Vec<TaskOverview>> {
    policy::require(actor, Action::ViewAllCompanyTasks)?;

    let tasks = sqlx::query_as::<_, TaskOverview>(
        "SELECT t.id, t.title, t.description, t.assigned_to, u.username AS assignee_username, \
                t.company_id, t.status, t.priority, t.start_date, t.deadline, t.created_at, t.updated_at \
         FROM tasks t \
         JOIN users u ON t.assigned_to = u.id \
         WHERE t.company_id = ? \
         ORDER BY CASE WHEN t.deadline IS NULL THEN 1 ELSE 0 END, t.deadline ASC, t.created_at DESC",
    )
    .bind(&actor.company_id)
    .fetch_all(&db.pool)
    .await?;
    Ok(tasks)
}

pub async fn list_own_tasks(db: &Database, actor: &Actor) -> Result<Vec<TaskOverview>> {
    policy::require(actor, Action::ViewOwnTasks)?;

    let tasks = sqlx::query_as::<_, TaskOverview>(
        "SELECT t.id, t.title, t.description, t.assigned_to, u.username AS assignee_username, \
                t.company_id, t.status, t.priority, t.start_date, t.deadline, t.created_at, t.updated_at \
         FROM tasks t \
         JOIN users u ON t.assigned_to = u.id \
         WHERE t.assigned_to = ? AND t.company_id = ? \
         ORDER BY t.created_at DESC",
    )
    .bind(&actor.id)
    .bind(&actor.company_id)
    .fetch_all(&db.pool)
    .await?;
    Ok(tasks)
}

/// Status change on the assignee path. The task must be assigned to the actor
/// within the actor's company, and the transition must be one the lifecycle
/// table allows; a completed task is locked for good on this path.
pub async fn update_own_status(
    db: &Database,
    actor: &Actor,
    task_id: &str,
    new_status: TaskStatus,
) -> Result<Task> {
    policy::require(actor, Action::UpdateOwnTaskStatus)?;

    let _guard = db.write_guard().await;

    let current = sqlx::query_scalar::<_, TaskStatus>(
        "SELECT status FROM tasks WHERE id = ? AND assigned_to = ? AND company_id = ?",
    )
    .bind(task_id)
    .bind(&actor.id)
    .bind(&actor.company_id)
    .fetch_optional(&db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    if !lifecycle::assignee_can_transition(current, new_status) {
        let reason = if current == TaskStatus::Completed {
            "Completed tasks can no longer be updated"
        } else {
            "Invalid status transition"
        };
        return Err(AppError::Forbidden(reason.to_string()));
    }

    let now = Utc::now();
    sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
        .bind(new_status)
        .bind(now)
        .bind(task_id)
        .execute(&db.pool)
        .await?;

    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_one(&db.pool)
        .await?;
    Ok(task)
}

/// Admin partial update, scoped to the admin's company. Bypasses the
/// lifecycle table (the escape hatch), but reassignment is still validated
/// against the tenant boundary.
pub async fn admin_update_task(
    db: &Database,
    actor: &Actor,
    task_id: &str,
    update: TaskUpdate,
) -> Result<Task> {
    policy::require(actor, Action::AdminUpdateTask)?;

    let _guard = db.write_guard().await;

    let mut task =
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND company_id = ?")
            .bind(task_id)
            .bind(&actor.company_id)
            .fetch_optional(&db.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    if let Some(assignee) = &update.assigned_to {
        let assignee_company =
            sqlx::query_scalar::<_, String>("SELECT company_id FROM users WHERE id = ?")
                .bind(assignee)
                .fetch_optional(&db.pool)
                .await?;
        if assignee_company.as_deref() != Some(actor.company_id.as_str()) {
            return Err(AppError::NotFound("Assignee not found".to_string()));
        }
    }

    if let Some(title) = update.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Task title is required".to_string()));
        }
        task.title = title;
    }
    if let Some(description) = update.description {
        task.description = description;
    }
    if let Some(assigned_to) = update.assigned_to {
        task.assigned_to = assigned_to;
    }
    if let Some(start_date) = update.start_date {
        task.start_date = Some(start_date);
    }
    if let Some(deadline) = update.deadline {
        task.deadline = Some(deadline);
    }
    if let Some(priority) = update.priority {
        task.priority = priority;
    }
    if let Some(status) = update.status {
        task.status = status;
    }
    task.updated_at = Utc::now();

    sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, assigned_to = ?, status = ?, priority = ?, \
                          start_date = ?, deadline = ?, updated_at = ? \
         WHERE id = ? AND company_id = ?",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.assigned_to)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.start_date)
    .bind(task.deadline)
    .bind(task.updated_at)
    .bind(&task.id)
    .bind(&actor.company_id)
    .execute(&db.pool)
    .await?;

    Ok(task)
}

/// Delete a task with its comments and attachment rows in one transaction.
/// Returns the stored file paths so the caller can remove the bytes after
/// the commit.
pub async fn admin_delete_task(db: &Database, actor: &Actor, task_id: &str) -> Result<Vec<String>> {
    policy::require(actor, Action::AdminDeleteTask)?;

    let _guard = db.write_guard().await;

    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM tasks WHERE id = ? AND company_id = ?",
    )
    .bind(task_id)
    .bind(&actor.company_id)
    .fetch_one(&db.pool)
    .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    let file_paths =
        sqlx::query_scalar::<_, String>("SELECT file_path FROM file_attachments WHERE task_id = ?")
            .bind(task_id)
            .fetch_all(&db.pool)
            .await?;

    let mut tx = db.pool.begin().await?;
    sqlx::query("DELETE FROM task_comments WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM file_attachments WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tasks WHERE id = ? AND company_id = ?")
        .bind(task_id)
        .bind(&actor.company_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(file_paths)
}

/// A task visible to the actor: same company, regardless of assignee.
/// Reads are company-scoped; only status mutation requires ownership.
pub async fn get_task(db: &Database, actor: &Actor, task_id: &str) -> Result<Task> {
    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND company_id = ?")
        .bind(task_id)
        .bind(&actor.company_id)
        .fetch_optional(&db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    Ok(task)
}

/// Visibility precondition shared by the comment and attachment operations.
pub(crate) async fn require_task_in_company(
    db: &Database,
    actor: &Actor,
    task_id: &str,
) -> Result<()> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM tasks WHERE id = ? AND company_id = ?",
    )
    .bind(task_id)
    .bind(&actor.company_id)
    .fetch_one(&db.pool)
    .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Task not found".to_string()));
    }
    Ok(())
}

/// Status and priority counts over the actor's visible task set: the whole
/// company for an Admin, own tasks otherwise.
pub async fn task_stats(db: &Database, actor: &Actor) -> Result<TaskStats> {
    let rows: Vec<(TaskStatus, TaskPriority)> = if actor.is_admin() {
        sqlx::query_as("SELECT status, priority FROM tasks WHERE company_id = ?")
            .bind(&actor.company_id)
            .fetch_all(&db.pool)
            .await?
    } else {
        sqlx::query_as("SELECT status, priority FROM tasks WHERE assigned_to = ? AND company_id = ?")
            .bind(&actor.id)
            .bind(&actor.company_id)
            .fetch_all(&db.pool)
            .await?
    };

    let mut stats = TaskStats {
        total: rows.len(),
        pending: 0,
        in_progress: 0,
        completed: 0,
        by_priority: PriorityStats {
            critical: 0,
            high: 0,
            medium: 0,
            low: 0,
        },
    };
    for (status, priority) in rows {
        match status {
            TaskStatus::Pending => stats.pending += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Completed => stats.completed += 1,
        }
        match priority {
            TaskPriority::Critical => stats.by_priority.critical += 1,
            TaskPriority::High => stats.by_priority.high += 1,
            TaskPriority::Medium => stats.by_priority.medium += 1,
            TaskPriority::Low => stats.by_priority.low += 1,
        }
    }
    Ok(stats)
}
