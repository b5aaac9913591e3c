use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::models::{Task, TaskStatus},
    error::Result,
    handlers::ws,
    policy::Actor,
    repo::{
        self,
        tasks::{NewTask, TaskOverview, TaskStats, TaskUpdate},
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_company_tasks).post(assign_task))
        .route("/mine", get(list_own_tasks))
        .route("/stats", get(task_stats))
        .route("/:id", put(admin_update_task).delete(admin_delete_task))
        .route("/:id/status", put(update_own_status))
}

async fn list_company_tasks(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<TaskOverview>>> {
    let tasks = repo::tasks::list_company_tasks(&state.db, &actor).await?;
    Ok(Json(tasks))
}

async fn list_own_tasks(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<TaskOverview>>> {
    let tasks = repo::tasks::list_own_tasks(&state.db, &actor).await?;
    Ok(Json(tasks))
}

async fn task_stats(State(state): State<AppState>, actor: Actor) -> Result<Json<TaskStats>> {
    let stats = repo::tasks::task_stats(&state.db, &actor).await?;
    Ok(Json(stats))
}

async fn assign_task(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<NewTask>,
) -> Result<Json<Task>> {
    let task = repo::tasks::assign_task(&state.db, &actor, body).await?;

    state
        .notifier
        .dispatch(&task.assigned_to, &format!("New task assigned: {}", task.title));
    ws::publish(
        &state.chat,
        &ws::user_room(&task.assigned_to),
        json!({
            "type": "task_assigned",
            "task_id": task.id,
            "title": task.title,
        }),
    )
    .await;

    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

async fn update_own_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(task_id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Task>> {
    let task = repo::tasks::update_own_status(&state.db, &actor, &task_id, body.status).await?;
    Ok(Json(task))
}

async fn admin_update_task(
    State(state): State<AppState>,
    actor: Actor,
    Path(task_id): Path<String>,
    Json(body): Json<TaskUpdate>,
) -> Result<Json<Task>> {
    let task = repo::tasks::admin_update_task(&state.db, &actor, &task_id, body).await?;
    Ok(Json(task))
}

async fn admin_delete_task(
    State(state): State<AppState>,
    actor: Actor,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let file_paths = repo::tasks::admin_delete_task(&state.db, &actor, &task_id).await?;

    // The rows are gone; stored bytes go best-effort afterwards.
    for path in &file_paths {
        state.storage.remove(path).await;
    }

    Ok(Json(json!({ "success": true })))
}
