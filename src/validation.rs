// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request body validation.
//!
//! Each request DTO implements [`ValidateRequest`], turning the raw,
//! all-optional JSON shape into a well-typed input or a list of field
//! violations. Handlers take [`ValidJson<T>`] and only ever see the valid
//! form.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{ValidateEmail, ValidateLength};

use crate::error::ApiError;

pub const BLANK: &str = "must not be blank";
pub const INVALID_EMAIL: &str = "Invalid email";
pub const PASSWORDS_DONT_MATCH: &str = "Passwords don't match";

/// One failed constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation of a deserialized request body.
pub trait ValidateRequest: DeserializeOwned {
    /// The checked, well-typed input handed to the handler.
    type Valid;

    fn validate(self) -> Result<Self::Valid, Vec<FieldViolation>>;
}

/// JSON body extractor that runs [`ValidateRequest::validate`].
///
/// Undecodable bodies are rejected with `BASIC_INVALID_INPUT`; constraint
/// failures with `JSON_SCHEMA_VALIDATOR` listing every violation.
pub struct ValidJson<T: ValidateRequest>(pub T::Valid);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: ValidateRequest,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        body.validate().map(ValidJson).map_err(ApiError::validation)
    }
}

/// Collects violations while a DTO is checked field by field.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    /// The value must be present, non-blank and
    /// within `min..=max` characters. Returns the value when it passed.
    pub fn required(
        &mut self,
        field: &str,
        value: Option<String>,
        min: u64,
        max: u64,
    ) -> Option<String> {
        match value {
            Some(v) if !v.trim().is_empty() => self.sized(field, Some(v), min, max),
            _ => {
                self.push(field, BLANK);
                None
            }
        }
    }

    /// Character-count bounds on an optional field; absent values pass.
    pub fn sized(
        &mut self,
        field: &str,
        value: Option<String>,
        min: u64,
        max: u64,
    ) -> Option<String> {
        let v = value?;
        if !v.validate_length(Some(min), Some(max), None) {
            self.push(field, format!("size must be between {min} and {max}"));
            return None;
        }
        Some(v)
    }

    /// Email syntax check; absent values are invalid.
    pub fn email(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value {
            Some(v) if v.validate_email() => Some(v),
            _ => {
                self.push(field, INVALID_EMAIL);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finish validation: `Ok(valid)` when nothing was recorded.
    pub fn finish<V>(self, valid: impl FnOnce() -> Option<V>) -> Result<V, Vec<FieldViolation>> {
        if !self.0.is_empty() {
            return Err(self.0);
        }
        valid().ok_or_else(Vec::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_reports_blank_once() {
        let mut v = Violations::new();
        assert_eq!(v.required("name", None, 4, 40), None);
        assert_eq!(v.required("name", Some("   ".into()), 4, 40), None);
        let errs = v.finish(|| Some(())).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| e.message == BLANK));
    }

    #[test]
    fn sized_checks_character_count() {
        let mut v = Violations::new();
        assert_eq!(v.sized("name", Some("as".into()), 4, 40), None);
        assert_eq!(v.sized("name", None, 4, 40), None);
        assert_eq!(v.sized("name", Some("Şenol".into()), 4, 40), Some("Şenol".into()));
        let errs = v.finish(|| Some(())).unwrap_err();
        assert_eq!(errs, vec![FieldViolation::new("name", "size must be between 4 and 40")]);
    }

    #[test]
    fn email_rejects_missing_and_malformed() {
        let mut v = Violations::new();
        assert_eq!(v.email("email", Some("anil1@x.com".into())), Some("anil1@x.com".into()));
        assert_eq!(v.email("email", Some("not-an-email".into())), None);
        assert_eq!(v.email("email", None), None);
        let errs = v.finish(|| Some(())).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].to_string(), "email: Invalid email");
    }

    #[test]
    fn finish_returns_valid_value_when_clean() {
        let v = Violations::new();
        assert!(v.is_empty());
        assert_eq!(v.finish(|| Some(7)), Ok(7));
    }
}
