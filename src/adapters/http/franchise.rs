//! Franchise routes: listing, creation, deletion, store management.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::domain::error::ServiceError;
use crate::domain::franchise::{Franchise, Store};
use crate::domain::user::{AuthUser, UserId};

/// Routes nested under `/api/franchise`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_franchises).post(create_franchise))
        .route("/:id", get(user_franchises).delete(delete_franchise))
        .route("/:id/store", post(create_store))
        .route("/:id/store/:store_id", delete(delete_store))
}

#[derive(Debug, Deserialize)]
struct AdminEmail {
    email: String,
}

#[derive(Debug, Deserialize)]
struct CreateFranchiseRequest {
    name: Option<String>,
    #[serde(default)]
    admins: Vec<AdminEmail>,
}

#[derive(Debug, Deserialize)]
struct CreateStoreRequest {
    name: Option<String>,
}

async fn list_franchises(
    State(state): State<AppState>,
) -> Result<Json<Vec<Franchise>>, ServiceError> {
    Ok(Json(state.franchises.list().await?))
}

async fn user_franchises(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Franchise>>, ServiceError> {
    Ok(Json(
        state.franchises.user_franchises(&caller, user_id).await?,
    ))
}

async fn create_franchise(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<CreateFranchiseRequest>,
) -> Result<Json<Franchise>, ServiceError> {
    let admin_emails = request.admins.into_iter().map(|a| a.email).collect();
    let franchise = state
        .franchises
        .create(&caller, request.name.unwrap_or_default(), admin_emails)
        .await?;
    Ok(Json(franchise))
}

async fn delete_franchise(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(franchise_id): Path<u64>,
) -> Result<Json<Value>, ServiceError> {
    state.franchises.delete(&caller, franchise_id).await?;
    Ok(Json(json!({"message": "franchise deleted"})))
}

async fn create_store(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(franchise_id): Path<u64>,
    Json(request): Json<CreateStoreRequest>,
) -> Result<Json<Store>, ServiceError> {
    let store = state
        .franchises
        .create_store(&caller, franchise_id, request.name.unwrap_or_default())
        .await?;
    Ok(Json(store))
}

async fn delete_store(
    State(state): State<AppState>,
    caller: AuthUser,
    Path((franchise_id, store_id)): Path<(u64, u64)>,
) -> Result<Json<Value>, ServiceError> {
    state
        .franchises
        .delete_store(&caller, franchise_id, store_id)
        .await?;
    Ok(Json(json!({"message": "store deleted"})))
}
