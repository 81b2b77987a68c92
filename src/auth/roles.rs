// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role names used for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of role names.
///
/// Roles are stored, signed into tokens and returned to clients as
/// authorities (`ROLE_USER`, `ROLE_ADMIN`).
///
/// ## Role Hierarchy
///
/// There is none: a route accepts a principal when it holds at least one of
/// the declared roles. Every authenticated principal holds `User`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum RoleName {
    /// Baseline role of every registered user
    #[serde(rename = "ROLE_USER")]
    User,
    /// Administrative access
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl RoleName {
    /// All known roles, in seeding order.
    pub const ALL: [RoleName; 2] = [RoleName::User, RoleName::Admin];

    /// Granted authority string (`ROLE_USER`).
    pub fn authority(&self) -> &'static str {
        match self {
            RoleName::User => "ROLE_USER",
            RoleName::Admin => "ROLE_ADMIN",
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.authority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_authority() {
        let json = serde_json::to_string(&RoleName::Admin).unwrap();
        assert_eq!(json, r#""ROLE_ADMIN""#);

        let parsed: RoleName = serde_json::from_str(r#""ROLE_USER""#).unwrap();
        assert_eq!(parsed, RoleName::User);
    }

    #[test]
    fn display_is_authority() {
        assert_eq!(RoleName::User.to_string(), "ROLE_USER");
        assert_eq!(RoleName::Admin.authority(), "ROLE_ADMIN");
    }
}
