//! User API handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sa_attachments::OwnerType;
use sa_models::{NewUser, UpdateUser};

use crate::error::ApiResult;
use crate::extractors::{AppState, Collection, Pagination};
use crate::multipart::read_upload_form;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let page = state.users.list(pagination.into()).await?;
    Ok(Json(Collection::from(page)))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.users.get(&id).await?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let validator = state.upload_validator(OwnerType::User);
    let form = read_upload_form(multipart, &validator, state.store()).await?;
    let (params, request) = form.into_request::<NewUser>(state.store()).await?;

    let user = state.users.create(params, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let validator = state.upload_validator(OwnerType::User);
    let form = read_upload_form(multipart, &validator, state.store()).await?;
    let (params, request) = form.into_request::<UpdateUser>(state.store()).await?;

    Ok(Json(state.users.update(&id, params, request).await?))
}

/// DELETE /api/users/:id
///
/// The last `SuperAdmin` cannot be deleted.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.users.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
