// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only endpoints.

use axum::{extract::State, Json};

use crate::{
    error::{ApiError, ExceptionResponse},
    models::UserCountResponse,
    state::AppState,
};

/// Number of registered users.
#[utoipa::path(
    get,
    path = "/admin/users/count",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User count", body = UserCountResponse),
        (status = 401, description = "Unauthorized - invalid or missing token", body = ExceptionResponse),
        (status = 403, description = "Forbidden - admin role required", body = ExceptionResponse)
    )
)]
pub async fn count_users(State(state): State<AppState>) -> Result<Json<UserCountResponse>, ApiError> {
    let count = state.store.count_users()?;
    Ok(Json(UserCountResponse { count }))
}
