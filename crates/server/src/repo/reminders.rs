use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::{models::Reminder, Database},
    error::{AppError, Result},
    policy::{self, Action, Actor},
};

#[derive(Debug, Deserialize)]
pub struct NewReminder {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub reminder_date: NaiveDate,
    pub alert_days_before: Option<i64>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ReminderView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub reminder_date: NaiveDate,
    pub alert_days_before: i64,
    pub created_by: String,
    pub creator_username: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_reminder(
    db: &Database,
    actor: &Actor,
    new_reminder: NewReminder,
) -> Result<Reminder> {
    policy::require(actor, Action::ManageReminders)?;

    let title = new_reminder.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Reminder title is required".to_string()));
    }

    let _guard = db.write_guard().await;

    let reminder = Reminder {
        id: super::new_id(),
        title: title.to_string(),
        description: new_reminder.description,
        reminder_date: new_reminder.reminder_date,
        alert_days_before: new_reminder.alert_days_before.unwrap_or(1),
        is_active: true,
        company_id: actor.company_id.clone(),
        created_by: actor.id.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO reminders (id, title, description, reminder_date, alert_days_before, is_active, company_id, created_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&reminder.id)
    .bind(&reminder.title)
    .bind(&reminder.description)
    .bind(reminder.reminder_date)
    .bind(reminder.alert_days_before)
    .bind(reminder.is_active)
    .bind(&reminder.company_id)
    .bind(&reminder.created_by)
    .bind(reminder.created_at)
    .execute(&db.pool)
    .await?;

    Ok(reminder)
}

pub async fn list_reminders(db: &Database, actor: &Actor) -> Result<Vec<ReminderView>> {
    policy::require(actor, Action::ManageReminders)?;

    let reminders = sqlx::query_as::<_, ReminderView>(
        "SELECT r.id, r.title, r.description, r.reminder_date, r.alert_days_before, \
                r.created_by, u.username AS creator_username, r.created_at \
         FROM reminders r \
         JOIN users u ON r.created_by = u.id \
         WHERE r.company_id = ? AND r.is_active = 1 \
         ORDER BY r.reminder_date ASC",
    )
    .bind(&actor.company_id)
    .fetch_all(&db.pool)
    .await?;
    Ok(reminders)
}

/// Reminders inside their alert window: due on or after today, and no more
/// than `alert_days_before` days out.
pub async fn upcoming_reminders(
    db: &Database,
    actor: &Actor,
    today: NaiveDate,
) -> Result<Vec<ReminderView>> {
    policy::require(actor, Action::ManageReminders)?;

    let reminders = sqlx::query_as::<_, ReminderView>(
        "SELECT r.id, r.title, r.description, r.reminder_date, r.alert_days_before, \
                r.created_by, u.username AS creator_username, r.created_at \
         FROM reminders r \
         JOIN users u ON r.created_by = u.id \
         WHERE r.company_id = ? AND r.is_active = 1 \
           AND DATE(r.reminder_date) <= DATE(?, '+' || r.alert_days_before || ' days') \
           AND DATE(r.reminder_date) >= DATE(?) \
         ORDER BY r.reminder_date ASC",
    )
    .bind(&actor.company_id)
    .bind(today)
    .bind(today)
    .fetch_all(&db.pool)
    .await?;
    Ok(reminders)
}

/// Soft delete: the row stays for audit, the reminder stops firing.
pub async fn delete_reminder(db: &Database, actor: &Actor, reminder_id: &str) -> Result<()> {
    policy::require(actor, Action::ManageReminders)?;

    let _guard = db.write_guard().await;

    let result = sqlx::query("UPDATE reminders SET is_active = 0 WHERE id = ? AND company_id = ?")
        .bind(reminder_id)
        .bind(&actor.company_id)
        .execute(&db.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Reminder not found".to_string()));
    }
    Ok(())
}
