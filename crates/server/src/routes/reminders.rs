use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    db::models::Reminder,
    error::Result,
    policy::Actor,
    repo::{
        self,
        reminders::{NewReminder, ReminderView},
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reminders).post(create_reminder))
        .route("/upcoming", get(upcoming_reminders))
        .route("/:id", delete(delete_reminder))
}

async fn list_reminders(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<ReminderView>>> {
    let reminders = repo::reminders::list_reminders(&state.db, &actor).await?;
    Ok(Json(reminders))
}

async fn create_reminder(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<NewReminder>,
) -> Result<Json<Reminder>> {
    let reminder = repo::reminders::create_reminder(&state.db, &actor, body).await?;
    Ok(Json(reminder))
}

async fn upcoming_reminders(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<ReminderView>>> {
    let today = Utc::now().date_naive();
    let reminders = repo::reminders::upcoming_reminders(&state.db, &actor, today).await?;
    Ok(Json(reminders))
}

async fn delete_reminder(
    State(state): State<AppState>,
    actor: Actor,
    Path(reminder_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    repo::reminders::delete_reminder(&state.db, &actor, &reminder_id).await?;
    Ok(Json(json!({ "success": true })))
}
