// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Runs on every request. When an `Authorization: Bearer <token>` header is
//! present the token is verified and the subject resolved to a principal,
//! which is published into a fresh [`SecurityContext`] stored in the request
//! extensions.
//!
//! This middleware never rejects a request itself: a bad or missing token
//! just leaves the context without a principal (recording why), and the
//! per-route [`intercept`](super::policy::intercept) decides whether that
//! matters. Public routes therefore work with any header.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::{AuthError, SecurityContext};
use crate::state::AppState;

/// Extract the bearer token, if any.
///
/// `Ok(None)` when no Authorization header is present.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    value
        .strip_prefix("Bearer ")
        .map(|t| Some(t.trim()))
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Populate `ctx` from the request headers.
pub fn establish(state: &AppState, headers: &HeaderMap, ctx: &mut SecurityContext) {
    let token = match bearer_token(headers) {
        Ok(Some(token)) => token,
        Ok(None) => return,
        Err(err) => {
            tracing::debug!(error_code = err.error_code(), "Ignoring authorization header");
            ctx.reject(err);
            return;
        }
    };

    let verified = match state.tokens.verify(token) {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(error_code = err.error_code(), "Bearer token rejected");
            ctx.reject(err);
            return;
        }
    };

    match state.auth.authenticate(&verified.subject, None, ctx) {
        Ok(_) => {}
        Err(AuthError::UserNotFound) | Err(AuthError::InvalidCredentials) => {
            tracing::warn!(
                username = %verified.subject,
                "Valid token for a user that no longer exists"
            );
            ctx.reject(AuthError::Unauthenticated);
        }
        Err(err) => {
            tracing::error!(error = %err, "Could not resolve token subject");
            ctx.reject(err);
        }
    }
}

/// Router-wide authentication middleware.
///
/// ```rust,ignore
/// router.layer(axum::middleware::from_fn_with_state(state, authenticate_request))
/// ```
pub async fn authenticate_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut ctx = SecurityContext::new();
    establish(&state, request.headers(), &mut ctx);
    request.extensions_mut().insert(ctx);
    next.run(request).await
}
