// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP error translation.
//!
//! Every failure leaving a handler is an [`ApiError`], rendered as:
//!
//! ```json
//! {"exception": {"statusCode": 400, "error": {"id": "SVC0007", "text": "Validation failed"}, "variables": ["name: must not be blank"]}}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::validation::FieldViolation;

/// Error categories carried in the `error` member of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BasicInvalidInput,
    GenericServiceError,
    ExtraInputNotAllowed,
    MandatoryInputMissing,
    Unauthorized,
    NotFound,
    JsonSchemaValidator,
    Forbidden,
}

impl ErrorKind {
    pub fn id(&self) -> &'static str {
        match self {
            ErrorKind::BasicInvalidInput => "SVC0001",
            ErrorKind::GenericServiceError => "SVC0002",
            ErrorKind::ExtraInputNotAllowed => "SVC0003",
            ErrorKind::MandatoryInputMissing => "SVC0004",
            ErrorKind::Unauthorized => "SVC0005",
            ErrorKind::NotFound => "SVC0006",
            ErrorKind::JsonSchemaValidator => "SVC0007",
            ErrorKind::Forbidden => "SVC0008",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            ErrorKind::BasicInvalidInput => "Invalid input value for message part %1",
            ErrorKind::GenericServiceError => {
                "The following service error occurred: %1. Error code is %2"
            }
            ErrorKind::ExtraInputNotAllowed => "Extra input %1 %2 not allowed on request",
            ErrorKind::MandatoryInputMissing => "Mandatory input %1 %2 is missing from request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "Request is not found",
            ErrorKind::JsonSchemaValidator => "Validation failed",
            ErrorKind::Forbidden => "Access denied",
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub variables: Vec<String>,
}

/// Error response envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExceptionResponse {
    pub exception: ExceptionBody,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionBody {
    /// HTTP status code, repeated in the body
    pub status_code: u16,
    pub error: ErrorDescriptor,
    /// Substitution values for the error text
    pub variables: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDescriptor {
    pub id: String,
    pub text: String,
}

impl ApiError {
    pub fn new<I, S>(status: StatusCode, kind: ErrorKind, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status,
            kind,
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorKind::NotFound, [message])
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::BasicInvalidInput, [message])
    }

    /// A 400 carrying a single schema-level message, e.g. a duplicate username.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::JsonSchemaValidator,
            [message],
        )
    }

    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::JsonSchemaValidator,
            violations.iter().map(ToString::to_string),
        )
    }

    pub fn mandatory_input_missing(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::MandatoryInputMissing,
            [message],
        )
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::ExtraInputNotAllowed,
            [message],
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::GenericServiceError,
            [message],
        )
    }

    fn body(&self) -> ExceptionResponse {
        ExceptionResponse {
            exception: ExceptionBody {
                status_code: self.status.as_u16(),
                error: ErrorDescriptor {
                    id: self.kind.id().to_string(),
                    text: self.kind.text().to_string(),
                },
                variables: self.variables.clone(),
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}: {:?}", self.status, self.kind, self.variables)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, kind = ?self.kind, variables = ?self.variables, "Request failed");
        } else {
            tracing::debug!(status = %self.status, kind = ?self.kind, variables = ?self.variables, "Request rejected");
        }
        (self.status, Json(self.body())).into_response()
    }
}

/// Fallback for unknown routes.
pub async fn not_found_fallback(uri: axum::http::Uri) -> ApiError {
    ApiError::not_found(format!("No handler found for {}", uri.path()))
}

/// Fallback for known routes called with an unsupported method.
pub async fn method_not_allowed_fallback(method: axum::http::Method) -> ApiError {
    ApiError::method_not_allowed(format!("Request method '{method}' is not supported"))
}
