//! Student API handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sa_attachments::OwnerType;
use sa_models::{NewStudent, UpdateStudent};

use crate::error::ApiResult;
use crate::extractors::{AppState, Collection, Pagination};
use crate::multipart::read_upload_form;

/// GET /api/students
pub async fn list_students(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let page = state.students.list(pagination.into()).await?;
    Ok(Json(Collection::from(page)))
}

/// GET /api/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.students.get(&id).await?))
}

/// POST /api/students
///
/// File fields: `documents`, `studentPhoto`, `fatherPhoto`, `motherPhoto`.
pub async fn create_student(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let validator = state.upload_validator(OwnerType::Student);
    let form = read_upload_form(multipart, &validator, state.store()).await?;
    let (params, request) = form.into_request::<NewStudent>(state.store()).await?;

    let student = state.students.create(params, request).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// PUT /api/students/:id
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let validator = state.upload_validator(OwnerType::Student);
    let form = read_upload_form(multipart, &validator, state.store()).await?;
    let (params, request) = form.into_request::<UpdateStudent>(state.store()).await?;

    Ok(Json(state.students.update(&id, params, request).await?))
}

/// DELETE /api/students/:id
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.students.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
