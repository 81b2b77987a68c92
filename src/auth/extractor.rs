// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authenticated principal.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal.username, principal.roles
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, Principal, SecurityContext};

/// Extractor for the principal published by the authentication middleware.
///
/// Rejects with the recorded token failure (or `MissingAuthHeader`) when the
/// request carries no authenticated principal.
pub struct Auth(pub Principal);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<SecurityContext>()
            .ok_or(AuthError::MissingAuthHeader)?;

        match ctx.principal() {
            Some(principal) => Ok(Auth(principal.clone())),
            None => Err(ctx.failure().cloned().unwrap_or(AuthError::MissingAuthHeader)),
        }
    }
}
