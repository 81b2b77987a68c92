// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential checking and principal resolution.

use std::sync::Arc;

use super::{AuthError, PasswordHasher, Principal, SecurityContext};
use crate::models::User;
use crate::storage::CredentialStore;

/// A successful authentication: the stored user and the principal derived
/// from it.
#[derive(Debug, Clone)]
pub struct Authentication {
    pub user: User,
    pub principal: Principal,
}

/// Resolves usernames (and optionally passwords) to principals.
///
/// Used by the login endpoint with a password, and by the authentication
/// middleware without one once a bearer token has been verified.
pub struct AuthenticationManager {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<PasswordHasher>,
}

impl AuthenticationManager {
    pub fn new(store: Arc<dyn CredentialStore>, passwords: Arc<PasswordHasher>) -> Self {
        Self { store, passwords }
    }

    /// Authenticate `username`, checking `password` when one is supplied.
    ///
    /// On success the principal is published into `ctx`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UserNotFound`] when no such user exists
    /// - [`AuthError::InvalidCredentials`] when the password does not match
    ///   or the user has no password set
    /// - [`AuthError::InternalError`] when the store fails
    pub fn authenticate(
        &self,
        username: &str,
        password: Option<&str>,
        ctx: &mut SecurityContext,
    ) -> Result<Authentication, AuthError> {
        let user = self
            .store
            .find_by_username(username)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(password) = password {
            let matches = user
                .password_hash
                .as_deref()
                .is_some_and(|hash| self.passwords.verify(password, hash));
            if !matches {
                tracing::debug!(username = %username, "Password mismatch");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let principal = Principal::new(&user.username, user.roles.iter().map(|r| r.name));
        ctx.publish(principal.clone());

        Ok(Authentication { user, principal })
    }
}
