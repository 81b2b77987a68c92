// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Credential Storage
//!
//! Users and roles are persisted in an embedded redb database under
//! `DATA_DIR`:
//!
//! ```text
//! {DATA_DIR}/
//!   users.redb    # users, username/email indexes, roles
//! ```
//!
//! Handlers and the authentication manager only see the [`CredentialStore`]
//! trait; [`UserDatabase`] is the one production implementation.

pub mod user_database;

use std::path::{Path, PathBuf};

use crate::auth::RoleName;
use crate::error::ApiError;
use crate::models::{NewUser, Role, User};

pub use user_database::{StorageError, StorageResult, UserDatabase};

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "users.redb";

/// Path of the user database for a given data directory.
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

/// Persistent lookup and storage of users and roles.
///
/// Implementations own their concurrency control; in particular
/// [`insert_user`](CredentialStore::insert_user) must fail with
/// [`StorageError::UsernameTaken`] or [`StorageError::EmailTaken`] rather
/// than store a duplicate, even under concurrent calls.
pub trait CredentialStore: Send + Sync {
    fn find_by_username(&self, username: &str) -> StorageResult<Option<User>>;

    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    fn exists_by_username(&self, username: &str) -> StorageResult<bool> {
        Ok(self.find_by_username(username)?.is_some())
    }

    fn exists_by_email(&self, email: &str) -> StorageResult<bool> {
        Ok(self.find_by_email(email)?.is_some())
    }

    /// Store a new user. The store assigns the id and timestamps.
    fn insert_user(&self, user: NewUser) -> StorageResult<User>;

    /// Apply profile changes to the user named `username` atomically,
    /// returning the stored row. `None` leaves a field untouched.
    fn update_profile(
        &self,
        username: &str,
        name: Option<String>,
        password_hash: Option<String>,
    ) -> StorageResult<User>;

    fn count_users(&self) -> StorageResult<u64>;

    fn find_role(&self, name: RoleName) -> StorageResult<Option<Role>>;

    /// Return the role row, creating it if absent.
    fn ensure_role(&self, name: RoleName) -> StorageResult<Role>;

    fn health_check(&self) -> StorageResult<()>;
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UsernameTaken | StorageError::EmailTaken => {
                ApiError::rejected(err.to_string())
            }
            StorageError::NotFound(what) => ApiError::not_found(what),
            other => {
                tracing::error!(error = %other, "Storage failure");
                ApiError::internal("Storage error")
            }
        }
    }
}
