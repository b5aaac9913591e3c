use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::{
    db::models::{Notification, PushSubscription},
    error::Result,
    policy::Actor,
    repo::{self, notifications::NewPushSubscription},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/subscribe", post(subscribe))
        .route("/subscriptions", get(list_subscriptions))
}

async fn list_notifications(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Notification>>> {
    let notifications = repo::notifications::list_own_notifications(&state.db, &actor).await?;
    Ok(Json(notifications))
}

async fn subscribe(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<NewPushSubscription>,
) -> Result<Json<serde_json::Value>> {
    repo::notifications::save_push_subscription(&state.db, &actor, body).await?;
    Ok(Json(json!({ "success": true })))
}

async fn list_subscriptions(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<PushSubscription>>> {
    let subscriptions = repo::notifications::list_own_subscriptions(&state.db, &actor).await?;
    Ok(Json(subscriptions))
}
