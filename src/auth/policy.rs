// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-operation authorization.
//!
//! Every route group is registered together with an [`OperationPolicy`]
//! naming the roles it requires and the query parameters it accepts. The
//! [`intercept`] middleware enforces it before the handler runs:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/admin/users/count", get(admin::count_users))
//!     .route_layer(from_fn_with_state(&policy::ADMIN_USER_COUNT, policy::intercept))
//! ```
//!
//! ## Decision
//!
//! | Declared roles | Principal | Outcome |
//! |----------------|-----------|---------|
//! | none | any | allowed |
//! | some | absent | 401 |
//! | some | no role in common | 403 |
//! | some | at least one in common | allowed |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, RoleName, SecurityContext};
use crate::error::ApiError;

/// Access rules of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationPolicy {
    /// Operation identifier, used in logs
    pub operation: &'static str,
    /// Roles of which the principal needs at least one; `None` is public
    pub required_roles: Option<&'static [RoleName]>,
    /// Query parameters the operation declares
    pub query_params: &'static [&'static str],
}

pub static AUTH_LOGIN: OperationPolicy = OperationPolicy {
    operation: "auth.login",
    required_roles: None,
    query_params: &[],
};

pub static AUTH_REGISTER: OperationPolicy = OperationPolicy {
    operation: "auth.register",
    required_roles: None,
    query_params: &[],
};

pub static USER_ME: OperationPolicy = OperationPolicy {
    operation: "user.me",
    required_roles: Some(&[RoleName::User, RoleName::Admin]),
    query_params: &[],
};

pub static ADMIN_USER_COUNT: OperationPolicy = OperationPolicy {
    operation: "admin.user_count",
    required_roles: Some(&[RoleName::Admin]),
    query_params: &[],
};

pub static PUBLIC_PING: OperationPolicy = OperationPolicy {
    operation: "public.ping",
    required_roles: None,
    query_params: &[],
};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Unauthenticated,
    Forbidden,
}

/// Decide whether the context's principal may run an operation requiring
/// `required` roles.
pub fn authorize(ctx: &SecurityContext, required: Option<&[RoleName]>) -> Decision {
    let Some(required) = required else {
        return Decision::Allowed;
    };
    match ctx.principal() {
        None => Decision::Unauthenticated,
        Some(principal) if principal.has_any_role(required) => Decision::Allowed,
        Some(_) => Decision::Forbidden,
    }
}

/// Reject query parameters the operation does not declare.
pub fn check_query(query: Option<&str>, allowed: &[&str]) -> Result<(), ApiError> {
    let Some(query) = query else {
        return Ok(());
    };

    let mut unexpected: Vec<String> = Vec::new();
    for (key, _) in url::form_urlencoded::parse(query.as_bytes()) {
        if !allowed.iter().any(|a| *a == key) && !unexpected.iter().any(|k| *k == key) {
            unexpected.push(key.into_owned());
        }
    }

    if unexpected.is_empty() {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "unexpected parameter: [{}]",
            unexpected.join(", ")
        )))
    }
}

/// Route middleware enforcing an [`OperationPolicy`].
///
/// Expects the [`SecurityContext`] inserted by
/// [`authenticate_request`](super::middleware::authenticate_request); a
/// missing context counts as unauthenticated.
pub async fn intercept(
    State(policy): State<&'static OperationPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(err) = check_query(request.uri().query(), policy.query_params) {
        return err.into_response();
    }

    let rejection = {
        let empty = SecurityContext::default();
        let ctx = request.extensions().get::<SecurityContext>().unwrap_or(&empty);
        match authorize(ctx, policy.required_roles) {
            Decision::Allowed => None,
            Decision::Unauthenticated => {
                let err = ctx.failure().cloned().unwrap_or(AuthError::MissingAuthHeader);
                tracing::debug!(
                    operation = policy.operation,
                    error_code = err.error_code(),
                    "Rejected unauthenticated request"
                );
                Some(err)
            }
            Decision::Forbidden => {
                tracing::warn!(
                    operation = policy.operation,
                    username = ctx.principal().map(|p| p.username.as_str()).unwrap_or_default(),
                    "Rejected request lacking required role"
                );
                Some(AuthError::InsufficientPermissions)
            }
        }
    };

    match rejection {
        Some(err) => err.into_response(),
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn ctx_with(roles: &[RoleName]) -> SecurityContext {
        let mut ctx = SecurityContext::new();
        ctx.publish(Principal::new("someone", roles.iter().copied()));
        ctx
    }

    #[test]
    fn admin_requirement_denies_plain_user() {
        let ctx = ctx_with(&[RoleName::User]);
        assert_eq!(authorize(&ctx, Some(&[RoleName::Admin])), Decision::Forbidden);
    }

    #[test]
    fn any_of_requirement_allows_user() {
        let ctx = ctx_with(&[RoleName::User]);
        assert_eq!(
            authorize(&ctx, Some(&[RoleName::User, RoleName::Admin])),
            Decision::Allowed
        );
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        let ctx = SecurityContext::new();
        assert_eq!(authorize(&ctx, USER_ME.required_roles), Decision::Unauthenticated);
        assert_eq!(authorize(&ctx, None), Decision::Allowed);
    }

    #[test]
    fn admin_passes_admin_requirement() {
        let ctx = ctx_with(&[RoleName::Admin]);
        assert_eq!(authorize(&ctx, ADMIN_USER_COUNT.required_roles), Decision::Allowed);
    }

    #[test]
    fn undeclared_query_parameters_are_rejected() {
        assert!(check_query(None, &[]).is_ok());
        assert!(check_query(Some(""), &[]).is_ok());
        assert!(check_query(Some("page=1"), &["page"]).is_ok());

        let err = check_query(Some("page=1&debug=true&debug=false&x"), &["page"]).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.variables, vec!["unexpected parameter: [debug, x]".to_string()]);
    }

    fn app(ctx: Option<SecurityContext>) -> Router {
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(from_fn_with_state(&ADMIN_USER_COUNT, intercept))
            .layer(axum::middleware::from_fn(
                move |mut request: Request, next: Next| {
                    let ctx = ctx.clone();
                    async move {
                        if let Some(ctx) = ctx {
                            request.extensions_mut().insert(ctx);
                        }
                        next.run(request).await
                    }
                },
            ))
    }

    async fn status_of(app: Router, uri: &str) -> StatusCode {
        app.oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn intercept_maps_decisions_to_statuses() {
        assert_eq!(status_of(app(None), "/admin").await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(app(Some(ctx_with(&[RoleName::User]))), "/admin").await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(app(Some(ctx_with(&[RoleName::Admin]))), "/admin").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(app(Some(ctx_with(&[RoleName::Admin]))), "/admin?verbose=1").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn intercept_reports_recorded_token_failure() {
        let mut ctx = SecurityContext::new();
        ctx.reject(AuthError::TokenExpired);

        let response = app(Some(ctx))
            .oneshot(HttpRequest::builder().uri("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["exception"]["variables"][0], "Token has expired");
    }
}
