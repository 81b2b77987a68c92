// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs signed with a server-held secret:
//!
//! ```json
//! {"sub": "anil1", "roles": ["ROLE_USER"], "iat": 1760000000, "exp": 1760003600}
//! ```
//!
//! Verification is stateless: any instance holding the secret can check a
//! token without a session lookup. There is no clock-skew leeway; a token is
//! rejected from the second `now >= exp`.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, RoleName};

/// Signed claims set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenClaims {
    /// Subject (username)
    sub: String,
    /// Granted roles
    #[serde(default)]
    roles: BTreeSet<RoleName>,
    /// Issued at (Unix seconds)
    iat: i64,
    /// Expiration (Unix seconds)
    exp: i64,
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub roles: BTreeSet<RoleName>,
    pub expires_at: i64,
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issue a token for `subject` valid from now until now + TTL.
    pub fn issue(&self, subject: &str, roles: &BTreeSet<RoleName>) -> Result<String, AuthError> {
        self.issue_at(subject, roles, Utc::now())
    }

    /// Issue a token as if signed at `issued_at`.
    pub fn issue_at(
        &self,
        subject: &str,
        roles: &BTreeSet<RoleName>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::InternalError("token expiry out of range".to_string()))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            roles: roles.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))
    }

    /// Verify signature and expiry, returning subject and roles.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        let claims = data.claims;
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(VerifiedToken {
            subject: claims.sub,
            roles: claims.roles,
            expires_at: claims.exp,
        })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
