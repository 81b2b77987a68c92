// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated principal and the request-scoped security context.

use std::collections::BTreeSet;

use super::{AuthError, RoleName};

/// The resolved identity attached to one in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Canonical username (token `sub` claim)
    pub username: String,

    /// Granted roles; always contains [`RoleName::User`]
    pub roles: BTreeSet<RoleName>,
}

impl Principal {
    /// Build a principal from stored roles, adding the baseline `User` role.
    pub fn new(username: impl Into<String>, roles: impl IntoIterator<Item = RoleName>) -> Self {
        let mut roles: BTreeSet<RoleName> = roles.into_iter().collect();
        roles.insert(RoleName::User);
        Self {
            username: username.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    /// True when the principal holds at least one of `required`.
    pub fn has_any_role(&self, required: &[RoleName]) -> bool {
        required.iter().any(|r| self.roles.contains(r))
    }
}

/// Per-request holder of the authentication outcome.
///
/// Created empty by the authentication middleware for every request and
/// stored in the request extensions. It is never shared between requests.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Principal>,
    /// Why no principal was established, when a token was presented
    failure: Option<AuthError>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an authenticated principal, replacing any previous one.
    pub fn publish(&mut self, principal: Principal) {
        self.principal = Some(principal);
        self.failure = None;
    }

    /// Record a failed authentication attempt.
    pub fn reject(&mut self, error: AuthError) {
        self.principal = None;
        self.failure = Some(error);
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn failure(&self) -> Option<&AuthError> {
        self.failure.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}
