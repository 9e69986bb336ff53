//! Auth routes: register, login, logout, user update.

use axum::extract::{Path, State};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::domain::error::ServiceError;
use crate::domain::user::{AuthUser, User, UserId};

/// Routes nested under `/api/auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register).put(login).delete(logout))
        .route("/:id", put(update_user))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateUserRequest {
    email: Option<String>,
    password: Option<String>,
}

/// `{user, token}` body returned by register and login.
#[derive(Debug, Serialize)]
struct SessionResponse {
    user: User,
    token: String,
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let session = state
        .auth
        .register(
            request.name.as_deref().unwrap_or(""),
            request.email.as_deref().unwrap_or(""),
            request.password.as_deref().unwrap_or(""),
        )
        .await?;
    Ok(Json(SessionResponse {
        user: session.user,
        token: session.token,
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ServiceError> {
    let session = state
        .auth
        .login(
            request.email.as_deref().unwrap_or(""),
            request.password.as_deref().unwrap_or(""),
        )
        .await?;
    Ok(Json(SessionResponse {
        user: session.user,
        token: session.token,
    }))
}

async fn logout(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ServiceError> {
    state.auth.logout(&caller).await?;
    Ok(Json(json!({"message": "logout successful"})))
}

async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<UserId>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ServiceError> {
    let user = state
        .auth
        .update_user(&caller, user_id, request.email, request.password)
        .await?;
    Ok(Json(user))
}
