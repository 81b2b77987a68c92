// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{middleware::authenticate_request, policy, RoleName},
    error::{
        method_not_allowed_fallback, not_found_fallback, ErrorDescriptor, ExceptionBody,
        ExceptionResponse,
    },
    models::{
        LoginRequest, MessageResponse, RegisterRequest, RoleResponse, UpdateUserRequest,
        UserCountResponse, UserResponse, UserWrapperResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod public;
pub mod users;

pub fn router(state: AppState) -> Router {
    let login = Router::new()
        .route("/auth/login", post(auth::login))
        .route_layer(from_fn_with_state(&policy::AUTH_LOGIN, policy::intercept));

    let register = Router::new()
        .route("/auth/register", post(auth::register))
        .route_layer(from_fn_with_state(&policy::AUTH_REGISTER, policy::intercept));

    let me = Router::new()
        .route("/user/me", get(users::get_me).patch(users::update_me))
        .route_layer(from_fn_with_state(&policy::USER_ME, policy::intercept));

    let admin = Router::new()
        .route("/admin/users/count", get(admin::count_users))
        .route_layer(from_fn_with_state(&policy::ADMIN_USER_COUNT, policy::intercept));

    let public = Router::new()
        .route("/public/ping", get(public::ping))
        .route_layer(from_fn_with_state(&policy::PUBLIC_PING, policy::intercept));

    let api = Router::new()
        .merge(login)
        .merge(register)
        .merge(me)
        .merge(admin)
        .merge(public)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .method_not_allowed_fallback(method_not_allowed_fallback)
        .fallback(not_found_fallback)
        .layer(from_fn_with_state(state.clone(), authenticate_request))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri().path(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::register,
        users::get_me,
        users::update_me,
        admin::count_users,
        public::ping,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginRequest,
            RegisterRequest,
            UpdateUserRequest,
            UserResponse,
            RoleResponse,
            RoleName,
            UserWrapperResponse,
            MessageResponse,
            UserCountResponse,
            ExceptionResponse,
            ExceptionBody,
            ErrorDescriptor
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and registration"),
        (name = "Users", description = "Current user profile"),
        (name = "Admin", description = "Administrative queries"),
        (name = "Public", description = "Unauthenticated endpoints"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
