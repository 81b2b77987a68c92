// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication and role-based authorization.
//!
//! ## Auth Flow
//!
//! 1. Client calls `POST /auth/login` (or `/auth/register`)
//! 2. [`AuthenticationManager`] checks the password against the stored
//!    Argon2 hash and resolves the user's roles
//! 3. [`TokenService`] issues an HS256 token `{sub, roles, iat, exp}`
//! 4. Client sends `Authorization: Bearer <token>` on later requests
//! 5. [`middleware::authenticate_request`] verifies the token and publishes
//!    the principal into the request's [`SecurityContext`]
//! 6. [`policy::intercept`] checks the route's declared roles
//!    (401 without a principal, 403 without a matching role)
//!
//! ## Security
//!
//! - Passwords are only ever stored as salted Argon2id hashes
//! - Tokens are self-contained; there is no server-side session
//! - No clock-skew leeway on expiry

pub mod claims;
pub mod error;
pub mod extractor;
pub mod manager;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use claims::{Principal, SecurityContext};
pub use error::AuthError;
pub use extractor::Auth;
pub use manager::{Authentication, AuthenticationManager};
pub use password::{HashingConfig, PasswordError, PasswordHasher};
pub use policy::OperationPolicy;
pub use roles::RoleName;
pub use token::{TokenService, VerifiedToken};
