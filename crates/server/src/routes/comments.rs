use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::models::TaskComment,
    error::Result,
    handlers::ws,
    policy::Actor,
    repo::{self, comments::CommentView},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/task/:task_id", get(list_comments).post(add_comment))
        .route("/unread_count", get(unread_count))
}

async fn list_comments(
    State(state): State<AppState>,
    actor: Actor,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<CommentView>>> {
    let comments = repo::comments::list_comments(&state.db, &actor, &task_id).await?;
    Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub comment: String,
}

async fn add_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path(task_id): Path<String>,
    Json(body): Json<AddCommentRequest>,
) -> Result<Json<TaskComment>> {
    let comment = repo::comments::add_comment(&state.db, &actor, &task_id, &body.comment).await?;

    // Tell the assignee unless they wrote the comment themselves.
    let task = repo::tasks::get_task(&state.db, &actor, &task_id).await?;
    if task.assigned_to != actor.id {
        state
            .notifier
            .dispatch(&task.assigned_to, &format!("New comment on task: {}", task.title));
    }
    ws::publish(
        &state.chat,
        &ws::company_room(&actor.company_id),
        json!({
            "type": "comment",
            "task_id": task_id,
            "message": format!("New comment on task from {}", actor.username),
        }),
    )
    .await;

    Ok(Json(comment))
}

async fn unread_count(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<serde_json::Value>> {
    let count = repo::comments::unread_count(&state.db, &actor).await?;
    Ok(Json(json!({ "count": count })))
}
