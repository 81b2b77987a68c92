// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthenticationManager, PasswordError, PasswordHasher, RoleName, TokenService};
use crate::config::SeedAdmin;
use crate::models::NewUser;
use crate::storage::{CredentialStore, StorageError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub passwords: Arc<PasswordHasher>,
    pub auth: Arc<AuthenticationManager>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        passwords: PasswordHasher,
    ) -> Self {
        let passwords = Arc::new(passwords);
        let auth = Arc::new(AuthenticationManager::new(store.clone(), passwords.clone()));
        Self {
            store,
            tokens: Arc::new(tokens),
            passwords,
            auth,
        }
    }

    /// Create every known role row that does not exist yet.
    pub fn seed_roles(&self) -> Result<(), SeedError> {
        for name in RoleName::ALL {
            self.store.ensure_role(name)?;
        }
        Ok(())
    }

    /// Create the configured admin account unless the username is taken.
    ///
    /// Returns whether a new account was created.
    pub fn seed_admin(&self, admin: &SeedAdmin) -> Result<bool, SeedError> {
        if self.store.exists_by_username(&admin.username)? {
            tracing::info!(username = %admin.username, "Admin account already present");
            return Ok(false);
        }

        let roles = vec![
            self.store.ensure_role(RoleName::User)?,
            self.store.ensure_role(RoleName::Admin)?,
        ];
        let user = self.store.insert_user(NewUser {
            name: admin.username.clone(),
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash: self.passwords.hash(&admin.password)?,
            roles,
        })?;

        tracing::info!(username = %user.username, user_id = %user.id, "Seeded admin account");
        Ok(true)
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory state with cheap hashing and both roles seeded.
    pub fn for_tests() -> Self {
        use crate::auth::HashingConfig;
        use crate::storage::UserDatabase;

        let store = Arc::new(UserDatabase::in_memory().expect("in-memory database"));
        let tokens = TokenService::new(
            b"test-secret-with-enough-entropy-for-hs256",
            chrono::Duration::hours(1),
        );
        let passwords = PasswordHasher::new(HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("hashing params");

        let state = Self::new(store, tokens, passwords);
        state.seed_roles().expect("seed roles");
        state
    }

    /// Insert a user directly, bypassing the HTTP layer.
    pub fn seed_user(&self, username: &str, password: &str, roles: &[RoleName]) -> crate::models::User {
        let roles = roles
            .iter()
            .map(|r| self.store.ensure_role(*r).expect("role"))
            .collect();
        self.store
            .insert_user(NewUser {
                name: format!("{username} name"),
                username: username.to_string(),
                email: format!("{username}@x.com"),
                password_hash: self.passwords.hash(password).expect("hash"),
                roles,
            })
            .expect("insert user")
    }
}
