//! Auth handlers

use crate::config::AppState;
use crate::error::Result;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub site_id: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub site_id: String,
    pub token: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(req) = payload?;
    info!("POST /api/auth/login - {}", req.site_id);

    let token = state.auth.login(&req.site_id, &req.password).await?;

    Ok(Json(LoginResponse {
        site_id: req.site_id,
        token,
    }))
}
