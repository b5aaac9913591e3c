use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    db::models::{Role, User},
    error::Result,
    policy::Actor,
    repo::{
        self,
        users::{NewUser, UserOverview},
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_company_users).post(create_user))
        .route("/all", get(list_all_users))
        .route("/company/:company_id", get(list_users_in_company))
        .route("/:id/deactivate", post(deactivate_user))
        .route("/:id/reactivate", post(reactivate_user))
        .route("/:id", delete(delete_user))
        .route("/me/telegram", put(set_telegram_chat_id))
        .route("/me/mobile", put(set_mobile_number))
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub company_id: String,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            company_id: user.company_id,
            is_active: user.is_active,
        }
    }
}

async fn list_company_users(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<UserResponse>>> {
    let users = repo::users::list_company_users(&state.db, &actor).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<NewUser>,
) -> Result<Json<UserResponse>> {
    let user = repo::users::create_user(&state.db, &actor, body).await?;
    Ok(Json(user.into()))
}

async fn list_all_users(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<UserOverview>>> {
    let users = repo::users::list_all_users(&state.db, &actor).await?;
    Ok(Json(users))
}

async fn list_users_in_company(
    State(state): State<AppState>,
    actor: Actor,
    Path(company_id): Path<String>,
) -> Result<Json<Vec<UserResponse>>> {
    let users = repo::users::list_users_in_company(&state.db, &actor, &company_id).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn deactivate_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    repo::users::deactivate_user(&state.db, &actor, &user_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn reactivate_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    repo::users::reactivate_user(&state.db, &actor, &user_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    repo::users::delete_user(&state.db, &actor, &user_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct TelegramRequest {
    pub chat_id: Option<String>,
}

async fn set_telegram_chat_id(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<TelegramRequest>,
) -> Result<Json<serde_json::Value>> {
    repo::users::set_telegram_chat_id(&state.db, &actor, body.chat_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct MobileRequest {
    pub mobile_number: Option<String>,
}

async fn set_mobile_number(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<MobileRequest>,
) -> Result<Json<serde_json::Value>> {
    repo::users::set_mobile_number(&state.db, &actor, body.mobile_number).await?;
    Ok(Json(json!({ "success": true })))
}
