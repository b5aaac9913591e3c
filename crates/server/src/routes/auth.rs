use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth,
    db::models::{Company, Role},
    error::Result,
    policy::Actor,
    repo,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        // The login form needs the company list before any session exists.
        .route("/companies", get(list_companies))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or mobile number.
    pub username: String,
    pub password: String,
    pub company_id: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub company_id: String,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = repo::users::authenticate(
        &state.db,
        &body.username,
        &body.password,
        &body.company_id,
    )
    .await?;

    let actor = Actor {
        id: user.id,
        username: user.username,
        role: user.role,
        company_id: user.company_id,
    };
    let token = auth::create_token(&actor, &state.config.jwt_secret)?;

    Ok(Json(AuthResponse {
        token,
        user: SessionUser {
            id: actor.id,
            username: actor.username,
            role: actor.role,
            company_id: actor.company_id,
        },
    }))
}

async fn list_companies(State(state): State<AppState>) -> Result<Json<Vec<Company>>> {
    let companies = repo::companies::list_companies(&state.db).await?;
    Ok(Json(companies))
}
