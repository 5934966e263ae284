use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};

use crate::api::repo_for;
use crate::blobs::FileUpload;
use crate::error::AppError;
use crate::models::*;
use crate::repository::PdfSource;
use crate::state::AppState;

pub(super) async fn list_semesters(State(state): State<AppState>) -> Result<Json<Vec<Semester>>, AppError> {
    let tree = state.repo.load_tree().await?;
    Ok(Json(tree))
}

pub(super) async fn replace_semesters(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(tree): Json<Vec<Semester>>,
) -> Result<StatusCode, AppError> {
    repo_for(&state, &headers).replace_tree(tree).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn create_semester(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewSemesterRequest>,
) -> Result<Json<Semester>, AppError> {
    let semester = repo_for(&state, &headers).add_semester(&req.name).await?;
    Ok(Json(semester))
}

pub(super) async fn get_semester(
    State(state): State<AppState>,
    Path(sem): Path<String>,
) -> Result<Json<Semester>, AppError> {
    let semester = state.repo.semester(&sem).await?;
    Ok(Json(semester))
}

pub(super) async fn rename_semester(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sem): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<Semester>, AppError> {
    let semester = repo_for(&state, &headers).rename_semester(&sem, &req.name).await?;
    Ok(Json(semester))
}

pub(super) async fn delete_semester(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sem): Path<String>,
) -> Result<StatusCode, AppError> {
    repo_for(&state, &headers).delete_semester(&sem).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn create_subject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sem): Path<String>,
    Json(req): Json<NewSubjectRequest>,
) -> Result<Json<Subject>, AppError> {
    let subject = repo_for(&state, &headers).add_subject(&sem, &req.name).await?;
    Ok(Json(subject))
}

pub(super) async fn get_subject(
    State(state): State<AppState>,
    Path((sem, sub)): Path<(String, String)>,
) -> Result<Json<Subject>, AppError> {
    let subject = state.repo.subject(&sem, &sub).await?;
    Ok(Json(subject))
}

pub(super) async fn rename_subject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((sem, sub)): Path<(String, String)>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<Subject>, AppError> {
    let subject = repo_for(&state, &headers)
        .rename_subject(&sem, &sub, &req.name)
        .await?;
    Ok(Json(subject))
}

pub(super) async fn delete_subject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((sem, sub)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    repo_for(&state, &headers).delete_subject(&sem, &sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn create_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((sem, sub)): Path<(String, String)>,
    Json(req): Json<NewPdfRequest>,
) -> Result<Json<Pdf>, AppError> {
    let source = match (req.url, req.data) {
        (Some(url), None) => PdfSource::Link(url),
        (None, Some(data)) => {
            let file_name = req.file_name.unwrap_or_else(|| format!("{}.pdf", req.title.trim()));
            PdfSource::Upload(FileUpload::from_base64(file_name, req.content_type, &data)?)
        }
        _ => {
            return Err(AppError::validation("exactly one of url or data is required"));
        }
    };

    let pdf = repo_for(&state, &headers)
        .add_pdf(&sem, &sub, &req.title, req.category, source)
        .await?;
    Ok(Json(pdf))
}

pub(super) async fn rename_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((sem, sub, pdf)): Path<(String, String, String)>,
    Json(req): Json<RenamePdfRequest>,
) -> Result<Json<Pdf>, AppError> {
    let pdf = repo_for(&state, &headers)
        .rename_pdf(&sem, &sub, &pdf, &req.title)
        .await?;
    Ok(Json(pdf))
}

pub(super) async fn delete_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((sem, sub, pdf)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    repo_for(&state, &headers).delete_pdf(&sem, &sub, &pdf).await?;
    Ok(StatusCode::NO_CONTENT)
}
