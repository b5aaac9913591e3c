use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::models::{Message, PrivateMessage},
    error::Result,
    handlers::ws,
    policy::Actor,
    repo::{
        self,
        messages::{CompanyMessageView, MessageView, PrivateMessageView, DEFAULT_FEED_LIMIT},
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_company_messages).post(post_company_message))
        .route("/all", get(list_all_messages))
        .route("/private", get(list_private_feed))
        .route(
            "/private/:user_id",
            get(list_private_thread).post(post_private_message),
        )
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}

impl FeedQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, 500)
    }
}

async fn list_company_messages(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<MessageView>>> {
    let messages =
        repo::messages::list_company_messages(&state.db, &actor, query.limit()).await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub message: String,
}

async fn post_company_message(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<PostMessageRequest>,
) -> Result<Json<Message>> {
    let message = repo::messages::post_company_message(&state.db, &actor, &body.message).await?;

    ws::publish(
        &state.chat,
        &ws::company_room(&actor.company_id),
        json!({
            "type": "message",
            "id": message.id,
            "message": message.message,
            "username": actor.username,
            "user_id": actor.id,
            "timestamp": message.timestamp,
        }),
    )
    .await;

    Ok(Json(message))
}

async fn list_all_messages(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<CompanyMessageView>>> {
    let messages = repo::messages::list_all_messages(&state.db, &actor, query.limit()).await?;
    Ok(Json(messages))
}

async fn list_private_feed(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PrivateMessageView>>> {
    let messages = repo::messages::list_private_feed(&state.db, &actor, query.limit()).await?;
    Ok(Json(messages))
}

async fn list_private_thread(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PrivateMessageView>>> {
    let messages =
        repo::messages::list_private_thread(&state.db, &actor, &user_id, query.limit()).await?;
    Ok(Json(messages))
}

async fn post_private_message(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
    Json(body): Json<PostMessageRequest>,
) -> Result<Json<PrivateMessage>> {
    let message =
        repo::messages::post_private_message(&state.db, &actor, &user_id, &body.message).await?;

    state
        .notifier
        .dispatch(&user_id, &format!("New message from {}", actor.username));
    ws::publish(
        &state.chat,
        &ws::user_room(&user_id),
        json!({
            "type": "private_message",
            "id": message.id,
            "message": message.message,
            "sender_username": actor.username,
            "sender_id": actor.id,
            "timestamp": message.timestamp,
        }),
    )
    .await;

    Ok(Json(message))
}
