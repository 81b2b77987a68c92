// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Persistent entities ([`User`], [`Role`]) and the request/response
//! structures of the REST API. Request DTOs keep every field optional so a
//! missing field is reported as a validation violation instead of a decode
//! error; see [`crate::validation`].
//!
//! ## Field Constraints
//!
//! | Field | Rule |
//! |-------|------|
//! | `name` | 4-40 characters |
//! | `username` | 3-20 characters |
//! | `email` | valid address |
//! | `password` | 6-20 characters |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::RoleName;
use crate::validation::{FieldViolation, ValidateRequest, Violations, PASSWORDS_DONT_MATCH};

pub const NAME_LEN: (u64, u64) = (4, 40);
pub const USERNAME_LEN: (u64, u64) = (3, 20);
pub const PASSWORD_LEN: (u64, u64) = (6, 20);

// =============================================================================
// Entities
// =============================================================================

/// A role row. One per [`RoleName`], seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: RoleName,
}

/// A registered user as stored in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Store-generated identifier (UUID v4), immutable
    pub id: String,
    pub name: String,
    /// Unique
    pub username: String,
    /// Unique
    pub email: String,
    /// Argon2 PHC string; `None` only before a password is first set
    pub password_hash: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.iter().any(|r| r.name == role)
    }
}

/// A user about to be inserted; the store assigns `id` and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

// =============================================================================
// Login
// =============================================================================

/// Request body of `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "asenocak")]
    #[serde(default)]
    pub username: Option<String>,
    #[schema(example = "asenocak")]
    #[serde(default)]
    pub password: Option<String>,
}

/// Checked login input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl ValidateRequest for LoginRequest {
    type Valid = Credentials;

    fn validate(self) -> Result<Credentials, Vec<FieldViolation>> {
        let mut v = Violations::new();
        let username = v.required("username", self.username, 1, u64::MAX);
        let password = v.required("password", self.password, 1, u64::MAX);
        v.finish(|| {
            Some(Credentials {
                username: username?,
                password: password?,
            })
        })
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Request body of `POST /auth/register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Anil")]
    #[serde(default)]
    pub name: Option<String>,
    #[schema(example = "anil1")]
    #[serde(default)]
    pub username: Option<String>,
    #[schema(example = "anil1@x.com")]
    #[serde(default)]
    pub email: Option<String>,
    #[schema(example = "secret1")]
    #[serde(default)]
    pub password: Option<String>,
}

/// Checked registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl ValidateRequest for RegisterRequest {
    type Valid = Registration;

    fn validate(self) -> Result<Registration, Vec<FieldViolation>> {
        let mut v = Violations::new();
        let name = v.required("name", self.name, NAME_LEN.0, NAME_LEN.1);
        let username = v.required("username", self.username, USERNAME_LEN.0, USERNAME_LEN.1);
        let email = v.email("email", self.email);
        let password = v.required("password", self.password, PASSWORD_LEN.0, PASSWORD_LEN.1);
        v.finish(|| {
            Some(Registration {
                name: name?,
                username: username?,
                email: email?,
                password: password?,
            })
        })
    }
}

// =============================================================================
// Profile Update
// =============================================================================

/// Request body of `PATCH /user/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "Anil")]
    #[serde(default)]
    pub name: Option<String>,
    #[schema(example = "Anil123")]
    #[serde(default)]
    pub password: Option<String>,
    #[schema(example = "Anil123")]
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

/// Checked profile changes; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

impl ValidateRequest for UpdateUserRequest {
    type Valid = ProfileUpdate;

    fn validate(self) -> Result<ProfileUpdate, Vec<FieldViolation>> {
        let mut v = Violations::new();
        if self.password != self.password_confirmation {
            v.push("password_confirmation", PASSWORDS_DONT_MATCH);
        }
        let name = v.sized("name", self.name, NAME_LEN.0, NAME_LEN.1);
        let password = v.sized("password", self.password, PASSWORD_LEN.0, PASSWORD_LEN.1);
        v.sized(
            "password_confirmation",
            self.password_confirmation,
            PASSWORD_LEN.0,
            PASSWORD_LEN.1,
        );
        v.finish(|| Some(ProfileUpdate { name, password }))
    }
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RoleResponse {
    pub name: RoleName,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    #[schema(example = "Lorem Ipsum")]
    pub name: String,
    #[schema(example = "asenocak")]
    pub username: String,
    #[schema(example = "lorem@ipsum.com")]
    pub email: String,
    pub roles: Vec<RoleResponse>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user
                .roles
                .iter()
                .map(|r| RoleResponse { name: r.name })
                .collect(),
        }
    }
}

/// `{user, token}` wrapper returned by login, registration and `GET /user/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserWrapperResponse {
    pub user: UserResponse,
    /// Bearer token; omitted outside login and registration
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "User updated.")]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCountResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errs: Vec<FieldViolation>) -> Vec<String> {
        errs.into_iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn empty_login_reports_both_fields() {
        let errs = LoginRequest::default().validate().unwrap_err();
        assert_eq!(
            messages(errs),
            vec!["username: must not be blank", "password: must not be blank"]
        );
    }

    #[test]
    fn login_yields_credentials() {
        let creds = LoginRequest {
            username: Some("anil1".into()),
            password: Some("secret1".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(creds.username, "anil1");
        assert_eq!(creds.password, "secret1");
    }

    #[test]
    fn empty_registration_reports_four_violations() {
        let errs = RegisterRequest::default().validate().unwrap_err();
        assert_eq!(
            messages(errs),
            vec![
                "name: must not be blank",
                "username: must not be blank",
                "email: Invalid email",
                "password: must not be blank",
            ]
        );
    }

    #[test]
    fn registration_checks_sizes() {
        let errs = RegisterRequest {
            name: Some("Ani".into()),
            username: Some("anil1".into()),
            email: Some("anil1@x.com".into()),
            password: Some("123".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            messages(errs),
            vec![
                "name: size must be between 4 and 40",
                "password: size must be between 6 and 20",
            ]
        );
    }

    #[test]
    fn update_with_short_name_is_rejected() {
        let errs = UpdateUserRequest {
            name: Some("as".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(messages(errs), vec!["name: size must be between 4 and 40"]);
    }

    #[test]
    fn update_password_without_confirmation_is_rejected() {
        let errs = UpdateUserRequest {
            password: Some("secret1".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            messages(errs),
            vec!["password_confirmation: Passwords don't match"]
        );
    }

    #[test]
    fn update_accepts_matching_password_and_empty_body() {
        let update = UpdateUserRequest {
            name: Some("Anil Senocak".into()),
            password: Some("secret2".into()),
            password_confirmation: Some("secret2".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(update.name.as_deref(), Some("Anil Senocak"));
        assert_eq!(update.password.as_deref(), Some("secret2"));

        assert_eq!(
            UpdateUserRequest::default().validate().unwrap(),
            ProfileUpdate::default()
        );
    }

    #[test]
    fn user_response_lists_stored_roles() {
        let now = Utc::now();
        let user = User {
            id: "id-1".into(),
            name: "Anil".into(),
            username: "anil1".into(),
            email: "anil1@x.com".into(),
            password_hash: None,
            roles: vec![Role {
                id: "r1".into(),
                name: RoleName::User,
            }],
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(json["roles"], serde_json::json!([{"name": "ROLE_USER"}]));
        assert!(user.has_role(RoleName::User));
        assert!(!user.has_role(RoleName::Admin));
    }
}
