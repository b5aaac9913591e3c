use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::{db::models::Company, error::Result, policy::Actor, repo, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_company))
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
}

async fn create_company(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateCompanyRequest>,
) -> Result<Json<Company>> {
    let company = repo::companies::create_company(&state.db, &actor, &body.name).await?;
    Ok(Json(company))
}
