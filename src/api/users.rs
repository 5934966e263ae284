use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};

use crate::api::repo_for;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub(super) async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = state.repo.get_users().await?;
    Ok(Json(users))
}

pub(super) async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = state.repo.get_user(&id).await?;
    Ok(Json(user))
}

pub(super) async fn save_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(user): Json<User>,
) -> Result<Json<User>, AppError> {
    let user = repo_for(&state, &headers).upsert_user(user).await?;
    Ok(Json(user))
}

pub(super) async fn replace_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut user): Json<User>,
) -> Result<Json<User>, AppError> {
    if !user.id.is_empty() && user.id != id {
        return Err(AppError::Conflict(format!("body id {} does not match path id {}", user.id, id)));
    }
    user.id = id;
    let user = repo_for(&state, &headers).upsert_user(user).await?;
    Ok(Json(user))
}

pub(super) async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    repo_for(&state, &headers).delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let user = repo_for(&state, &headers).update_profile(&id, req).await?;
    Ok(Json(user))
}

pub(super) async fn update_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UserPermissions>,
) -> Result<Json<User>, AppError> {
    let user = repo_for(&state, &headers).set_permissions(&id, req).await?;
    Ok(Json(user))
}
