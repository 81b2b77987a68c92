// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Current-user endpoints.

use axum::{extract::State, Json};

use crate::{
    auth::{Auth, AuthError},
    error::{ApiError, ExceptionResponse},
    models::{MessageResponse, UpdateUserRequest, User, UserResponse, UserWrapperResponse},
    state::AppState,
    storage::StorageError,
    validation::ValidJson,
};

pub const USER_UPDATED: &str = "User updated.";

fn load_user(state: &AppState, username: &str) -> Result<User, ApiError> {
    state
        .store
        .find_by_username(username)?
        .ok_or_else(|| AuthError::UserNotFound.into())
}

/// Get the profile of the authenticated user.
#[utoipa::path(
    get,
    path = "/user/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User profile", body = UserWrapperResponse),
        (status = 401, description = "Unauthorized - invalid or missing token", body = ExceptionResponse),
        (status = 403, description = "Forbidden", body = ExceptionResponse)
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<Json<UserWrapperResponse>, ApiError> {
    let user = load_user(&state, &principal.username)?;
    Ok(Json(UserWrapperResponse {
        user: UserResponse::from(&user),
        token: None,
    }))
}

/// Change the name and/or password of the authenticated user.
///
/// A new password must be repeated in `password_confirmation`.
#[utoipa::path(
    patch,
    path = "/user/me",
    tag = "Users",
    security(("bearer" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 400, description = "Validation failed", body = ExceptionResponse),
        (status = 401, description = "Unauthorized - invalid or missing token", body = ExceptionResponse)
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    Auth(principal): Auth,
    ValidJson(update): ValidJson<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let password_hash = update
        .password
        .as_deref()
        .map(|password| state.passwords.hash(password))
        .transpose()?;
    let password_changed = password_hash.is_some();

    let user = state
        .store
        .update_profile(&principal.username, update.name, password_hash)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::from(AuthError::UserNotFound),
            other => other.into(),
        })?;
    tracing::info!(username = %user.username, password_changed, "User updated");

    Ok(Json(MessageResponse {
        message: USER_UPDATED.to_string(),
    }))
}
