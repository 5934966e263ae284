mod content;
mod events;
mod site;
mod users;

use axum::http::HeaderMap;
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use uuid::Uuid;

use crate::error::AppError;
use crate::repository::ContentRepository;
use crate::state::AppState;

/// Header carrying the caller's context id. Writes made under an id are never
/// echoed back to event streams opened with the same id.
pub const CONTEXT_HEADER: &str = "x-context-id";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/semesters",
            get(content::list_semesters)
                .put(content::replace_semesters)
                .post(content::create_semester),
        )
        .route(
            "/semesters/{sem}",
            get(content::get_semester)
                .patch(content::rename_semester)
                .delete(content::delete_semester),
        )
        .route("/semesters/{sem}/subjects", post(content::create_subject))
        .route(
            "/semesters/{sem}/subjects/{sub}",
            get(content::get_subject)
                .patch(content::rename_subject)
                .delete(content::delete_subject),
        )
        .route("/semesters/{sem}/subjects/{sub}/pdfs", post(content::create_pdf))
        .route(
            "/semesters/{sem}/subjects/{sub}/pdfs/{pdf}",
            patch(content::rename_pdf).delete(content::delete_pdf),
        )
        .route("/users", get(users::list_users).post(users::save_user))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::replace_user).delete(users::delete_user),
        )
        .route("/users/{id}/profile", patch(users::update_profile))
        .route("/users/{id}/permissions", patch(users::update_permissions))
        .route("/announcement", get(site::get_announcement).put(site::set_announcement))
        .route(
            "/session",
            get(site::current_session).post(site::login).delete(site::logout),
        )
        .route(
            "/settings/login-appearance",
            get(site::get_login_appearance).put(site::set_login_appearance),
        )
        .route("/settings/font", get(site::get_font).put(site::set_font))
        .route("/events", get(events::stream_events))
        .with_state(state)
}

fn parse_context(raw: Option<&str>) -> Option<Uuid> {
    raw.and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// Repository handle for the calling context, or a fresh one.
fn repo_for(state: &AppState, headers: &HeaderMap) -> ContentRepository {
    let header = headers.get(CONTEXT_HEADER).and_then(|v| v.to_str().ok());
    match parse_context(header) {
        Some(context) => state.repo.for_context(context),
        None => state.repo.new_context(),
    }
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.repo.check_storage().await?;
    Ok(StatusCode::OK)
}
