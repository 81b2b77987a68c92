// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and registration endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{AuthError, RoleName, SecurityContext},
    error::{ApiError, ExceptionResponse},
    models::{LoginRequest, NewUser, RegisterRequest, UserResponse, UserWrapperResponse},
    state::AppState,
    storage::StorageError,
    validation::ValidJson,
};

pub const ROLE_NOT_FOUND: &str = "User Role is not found";
pub const TOKEN_GENERATION_FAILED: &str = "Error occurred for generating jwt attempt";

/// Authenticate with username and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = UserWrapperResponse),
        (status = 400, description = "Validation failed", body = ExceptionResponse),
        (status = 401, description = "Wrong password", body = ExceptionResponse),
        (status = 404, description = "Unknown username", body = ExceptionResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(credentials): ValidJson<LoginRequest>,
) -> Result<Json<UserWrapperResponse>, ApiError> {
    let mut ctx = SecurityContext::new();
    let auth = state
        .auth
        .authenticate(&credentials.username, Some(&credentials.password), &mut ctx)
        .inspect_err(|e| {
            tracing::info!(
                username = %credentials.username,
                error_code = e.error_code(),
                "Login failed"
            );
        })?;

    let token = state.tokens.issue(&auth.principal.username, &auth.principal.roles)?;

    tracing::info!(username = %auth.user.username, "User logged in");
    Ok(Json(UserWrapperResponse {
        user: UserResponse::from(&auth.user),
        token: Some(token),
    }))
}

/// Create an account and log it in.
///
/// New accounts get the `ROLE_USER` role.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered and authenticated", body = UserWrapperResponse),
        (status = 400, description = "Validation failed, username or email taken", body = ExceptionResponse),
        (status = 500, description = "Token generation failed", body = ExceptionResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(registration): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserWrapperResponse>), ApiError> {
    if state.store.exists_by_username(&registration.username)? {
        return Err(StorageError::UsernameTaken.into());
    }
    if state.store.exists_by_email(&registration.email)? {
        return Err(StorageError::EmailTaken.into());
    }

    let role = state
        .store
        .find_role(RoleName::User)?
        .ok_or_else(|| ApiError::mandatory_input_missing(ROLE_NOT_FOUND))?;

    // A concurrent registration can still win between the checks above and
    // this insert; the store re-checks inside its write transaction.
    let user = state.store.insert_user(NewUser {
        name: registration.name,
        username: registration.username,
        email: registration.email,
        password_hash: state.passwords.hash(&registration.password)?,
        roles: vec![role],
    })?;
    tracing::info!(username = %user.username, user_id = %user.id, "User registered");

    let mut ctx = SecurityContext::new();
    let token = state
        .auth
        .authenticate(&user.username, Some(&registration.password), &mut ctx)
        .and_then(|auth| state.tokens.issue(&auth.principal.username, &auth.principal.roles))
        .map_err(|e: AuthError| {
            tracing::error!(
                username = %user.username,
                error_code = e.error_code(),
                "Could not log in freshly registered user"
            );
            ApiError::internal(TOKEN_GENERATION_FAILED)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(UserWrapperResponse {
            user: UserResponse::from(&user),
            token: Some(token),
        }),
    ))
}
