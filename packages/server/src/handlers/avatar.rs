use axum::extract::{Multipart, State};
use axum::{Json, http::StatusCode};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::AppPath;
use crate::models::avatar::AvatarResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}/avatar",
    tag = "Avatars",
    operation_id = "getAvatar",
    summary = "Get a user's avatar",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Avatar image", body = AvatarResponse),
        (status = 404, description = "No avatar, or its file is missing (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(user_id = %id))]
pub async fn get_avatar(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<AvatarResponse>, AppError> {
    let data = state.avatars.find_or_save_avatar(id, None).await?;
    Ok(Json(AvatarResponse { user_id: id, data }))
}

#[utoipa::path(
    post,
    path = "/{id}/avatar",
    tag = "Avatars",
    operation_id = "uploadAvatar",
    summary = "Upload or replace a user's avatar",
    description = "Stores the `file` multipart field as the user's avatar, replacing any previous one.",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body(content_type = "multipart/form-data", description = "Image file in the `file` field"),
    responses(
        (status = 200, description = "Stored avatar", body = AvatarResponse),
        (status = 400, description = "Missing, empty or oversized file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(user_id = %id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>, AppError> {
    state.users.find_one(id).await?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
            file = Some(bytes);
        }
    }

    let bytes = file.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let data = state.avatars.find_or_save_avatar(id, Some(bytes.as_ref())).await?;

    Ok(Json(AvatarResponse { user_id: id, data }))
}

#[utoipa::path(
    delete,
    path = "/{id}/avatar",
    tag = "Avatars",
    operation_id = "deleteAvatar",
    summary = "Delete a user's avatar",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Avatar deleted"),
        (status = 404, description = "No avatar for this user (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(user_id = %id))]
pub async fn delete_avatar(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.avatars.delete_avatar(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
