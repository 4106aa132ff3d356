//! HTTP handlers for authentication endpoints

use axum::{
    extract::State,
    http::header::AUTHORIZATION,
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::{Actor, CurrentActor};
use crate::services::auth::{
    AuthService, LoginInput, RegisterInput, SessionResponse, UserProfile, WorkerLoginInput,
};
use crate::AppState;

/// Register a manager account (admin only)
pub async fn register(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<UserProfile>> {
    if !actor.is_admin() {
        return Err(AppError::InsufficientPermissions);
    }

    let service = AuthService::new(state.db, state.tokens.clone(), &state.config);
    let profile = service.register(input).await?;
    Ok(Json(profile))
}

/// Manager login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<SessionResponse>> {
    let service = AuthService::new(state.db, state.tokens.clone(), &state.config);
    let session = service.login(input).await?;
    Ok(Json(session))
}

/// Worker login with an invite code
pub async fn worker_login(
    State(state): State<AppState>,
    Json(input): Json<WorkerLoginInput>,
) -> AppResult<Json<SessionResponse>> {
    let service = AuthService::new(state.db, state.tokens.clone(), &state.config);
    let session = service.worker_login(input).await?;
    Ok(Json(session))
}

/// Invalidate the caller's session token
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidToken)?;

    let service = AuthService::new(state.db, state.tokens.clone(), &state.config);
    service.logout(token);
    Ok(Json(json!({ "logged_out": true })))
}

/// Describe the authenticated caller
pub async fn me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<Value>> {
    match actor {
        Actor::Manager { user_id, .. } => {
            let service = AuthService::new(state.db, state.tokens.clone(), &state.config);
            let profile = service.get_profile(user_id).await?;
            Ok(Json(json!({ "kind": "manager", "profile": profile })))
        }
        Actor::Worker { worker_id, shop_id } => Ok(Json(json!({
            "kind": "worker",
            "worker_id": worker_id,
            "shop_id": shop_id,
        }))),
    }
}
