//! Staff API handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sa_attachments::OwnerType;
use sa_models::{NewStaff, UpdateStaff};

use crate::error::ApiResult;
use crate::extractors::{AppState, Collection, Pagination};
use crate::multipart::read_upload_form;

/// GET /api/staff
pub async fn list_staff(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let page = state.staff.list(pagination.into()).await?;
    Ok(Json(Collection::from(page)))
}

/// GET /api/staff/:id
pub async fn get_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.staff.get(&id).await?))
}

/// POST /api/staff
pub async fn create_staff(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let validator = state.upload_validator(OwnerType::Staff);
    let form = read_upload_form(multipart, &validator, state.store()).await?;
    let (params, request) = form.into_request::<NewStaff>(state.store()).await?;

    let staff = state.staff.create(params, request).await?;
    Ok((StatusCode::CREATED, Json(staff)))
}

/// PUT /api/staff/:id
pub async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let validator = state.upload_validator(OwnerType::Staff);
    let form = read_upload_form(multipart, &validator, state.store()).await?;
    let (params, request) = form.into_request::<UpdateStaff>(state.store()).await?;

    Ok(Json(state.staff.update(&id, params, request).await?))
}

/// DELETE /api/staff/:id
pub async fn delete_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.staff.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
