use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;

use crate::api::repo_for;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginRequest {
    user_id: String,
}

pub(super) async fn get_announcement(State(state): State<AppState>) -> Result<Json<Announcement>, AppError> {
    let announcement = state.repo.get_announcement().await?;
    Ok(Json(announcement))
}

pub(super) async fn set_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>, AppError> {
    let announcement = repo_for(&state, &headers).set_announcement(&req.text).await?;
    Ok(Json(announcement))
}

pub(super) async fn current_session(State(state): State<AppState>) -> Result<Json<Option<User>>, AppError> {
    let user = state.repo.current_user().await?;
    Ok(Json(user))
}

pub(super) async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    let user = repo_for(&state, &headers).login(&req.user_id).await?;
    Ok(Json(user))
}

pub(super) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, AppError> {
    repo_for(&state, &headers).logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn get_login_appearance(
    State(state): State<AppState>,
) -> Result<Json<LoginAppearance>, AppError> {
    let appearance = state.repo.login_appearance().await?;
    Ok(Json(appearance))
}

pub(super) async fn set_login_appearance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginAppearance>,
) -> Result<Json<LoginAppearance>, AppError> {
    let appearance = repo_for(&state, &headers).set_login_appearance(req).await?;
    Ok(Json(appearance))
}

pub(super) async fn get_font(State(state): State<AppState>) -> Result<Json<FontPreference>, AppError> {
    let font = state.repo.font().await?;
    Ok(Json(FontPreference { font }))
}

pub(super) async fn set_font(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<FontPreference>,
) -> Result<Json<FontPreference>, AppError> {
    let font = repo_for(&state, &headers).set_font(&req.font).await?;
    Ok(Json(FontPreference { font }))
}
