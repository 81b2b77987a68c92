// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized [`User`]
//! - `username_index`: username → user id
//! - `email_index`: lowercase email → user id
//! - `roles`: authority (`ROLE_USER`) → serialized [`Role`]
//!
//! Uniqueness of username and email is enforced inside the write
//! transaction that inserts the user, so two concurrent registrations of the
//! same name cannot both commit.

use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use uuid::Uuid;

use super::CredentialStore;
use crate::auth::RoleName;
use crate::models::{NewUser, Role, User};

// =============================================================================
// Table Definitions
// =============================================================================

const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

const USERNAME_INDEX: TableDefinition<&str, &str> = TableDefinition::new("username_index");

/// Keys are lowercased so lookups ignore case.
const EMAIL_INDEX: TableDefinition<&str, &str> = TableDefinition::new("email_index");

const ROLES: TableDefinition<&str, &[u8]> = TableDefinition::new("roles");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("data directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Username is already taken!")]
    UsernameTaken,

    #[error("Email Address already in use!")]
    EmailTaken,

    #[error("not found: {0}")]
    NotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// UserDatabase
// =============================================================================

/// redb-backed [`CredentialStore`].
#[derive(Debug)]
pub struct UserDatabase {
    db: Database,
}

impl UserDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Database::create(path)?)
    }

    /// A database that lives only as long as the process.
    pub fn in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAME_INDEX)?;
            let _ = write_txn.open_table(EMAIL_INDEX)?;
            let _ = write_txn.open_table(ROLES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn find_by_index(
        &self,
        index: TableDefinition<'static, &'static str, &'static str>,
        key: &str,
    ) -> StorageResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(index)?;
        let Some(id) = index.get(key)?.map(|v| v.value().to_string()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            // Index entry without a row: treat as absent
            None => Ok(None),
        }
    }
}

impl CredentialStore for UserDatabase {
    fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        self.find_by_index(USERNAME_INDEX, username)
    }

    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.find_by_index(EMAIL_INDEX, &email_key(email))
    }

    fn insert_user(&self, new_user: NewUser) -> StorageResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new_user.name,
            username: new_user.username,
            email: new_user.email,
            password_hash: Some(new_user.password_hash),
            roles: new_user.roles,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_vec(&user)?;
        let email = email_key(&user.email);

        let write_txn = self.db.begin_write()?;
        {
            let mut usernames = write_txn.open_table(USERNAME_INDEX)?;
            if usernames.get(user.username.as_str())?.is_some() {
                return Err(StorageError::UsernameTaken);
            }
            let mut emails = write_txn.open_table(EMAIL_INDEX)?;
            if emails.get(email.as_str())?.is_some() {
                return Err(StorageError::EmailTaken);
            }

            usernames.insert(user.username.as_str(), user.id.as_str())?;
            emails.insert(email.as_str(), user.id.as_str())?;
            let mut users = write_txn.open_table(USERS)?;
            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        tracing::debug!(user_id = %user.id, username = %user.username, "User inserted");
        Ok(user)
    }

    fn update_profile(
        &self,
        username: &str,
        name: Option<String>,
        password_hash: Option<String>,
    ) -> StorageResult<User> {
        let not_found = || StorageError::NotFound(format!("User {username}"));

        // Read and write the row in one transaction so concurrent changes
        // to different fields are both kept
        let write_txn = self.db.begin_write()?;
        let updated = {
            let usernames = write_txn.open_table(USERNAME_INDEX)?;
            let id = usernames
                .get(username)?
                .map(|v| v.value().to_string())
                .ok_or_else(not_found)?;

            let mut users = write_txn.open_table(USERS)?;
            let mut user: User = {
                let row = users.get(id.as_str())?.ok_or_else(not_found)?;
                serde_json::from_slice(row.value())?
            };

            if let Some(name) = name {
                user.name = name;
            }
            if let Some(hash) = password_hash {
                user.password_hash = Some(hash);
            }
            user.updated_at = Utc::now();

            let json = serde_json::to_vec(&user)?;
            users.insert(id.as_str(), json.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(updated)
    }

    fn count_users(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        Ok(users.len()?)
    }

    fn find_role(&self, name: RoleName) -> StorageResult<Option<Role>> {
        let read_txn = self.db.begin_read()?;
        let roles = read_txn.open_table(ROLES)?;
        match roles.get(name.authority())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn ensure_role(&self, name: RoleName) -> StorageResult<Role> {
        let write_txn = self.db.begin_write()?;
        let role = {
            let mut roles = write_txn.open_table(ROLES)?;
            let existing = match roles.get(name.authority())? {
                Some(value) => Some(serde_json::from_slice::<Role>(value.value())?),
                None => None,
            };
            match existing {
                Some(role) => role,
                None => {
                    let role = Role {
                        id: Uuid::new_v4().to_string(),
                        name,
                    };
                    let json = serde_json::to_vec(&role)?;
                    roles.insert(name.authority(), json.as_slice())?;
                    tracing::info!(role = %name, "Seeded role");
                    role
                }
            }
        };
        write_txn.commit()?;
        Ok(role)
    }

    fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn db() -> UserDatabase {
        UserDatabase::in_memory().unwrap()
    }

    fn new_user(db: &UserDatabase, username: &str, email: &str) -> NewUser {
        NewUser {
            name: "Lorem Ipsum".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            roles: vec![db.ensure_role(RoleName::User).unwrap()],
        }
    }

    #[test]
    fn insert_and_find_by_username_and_email() {
        let db = db();
        let inserted = db.insert_user(new_user(&db, "anil1", "Anil1@X.com")).unwrap();
        assert!(!inserted.id.is_empty());

        let by_name = db.find_by_username("anil1").unwrap().unwrap();
        assert_eq!(by_name, inserted);

        let by_email = db.find_by_email("anil1@x.com").unwrap().unwrap();
        assert_eq!(by_email.id, inserted.id);
        assert_eq!(by_email.email, "Anil1@X.com");

        assert!(db.find_by_username("nobody").unwrap().is_none());
        assert!(db.exists_by_username("anil1").unwrap());
        assert!(db.exists_by_email("ANIL1@x.com").unwrap());
        assert!(!db.exists_by_email("other@x.com").unwrap());
    }

    #[test]
    fn duplicate_username_is_rejected_inside_transaction() {
        let db = db();
        db.insert_user(new_user(&db, "anil1", "anil1@x.com")).unwrap();

        let err = db
            .insert_user(new_user(&db, "anil1", "other@x.com"))
            .unwrap_err();
        assert!(matches!(err, StorageError::UsernameTaken));

        // The failed insert left no trace in the email index
        assert!(!db.exists_by_email("other@x.com").unwrap());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let db = db();
        db.insert_user(new_user(&db, "anil1", "anil1@x.com")).unwrap();

        let err = db
            .insert_user(new_user(&db, "anil2", "ANIL1@X.COM"))
            .unwrap_err();
        assert!(matches!(err, StorageError::EmailTaken));
        assert!(!db.exists_by_username("anil2").unwrap());
    }

    #[test]
    fn profile_update_persists_changes_and_keeps_created_at() {
        let db = db();
        let user = db.insert_user(new_user(&db, "anil1", "anil1@x.com")).unwrap();

        let updated = db
            .update_profile(
                "anil1",
                Some("Anil Senocak".to_string()),
                Some("$argon2id$other".to_string()),
            )
            .unwrap();
        assert_eq!(updated.created_at, user.created_at);
        assert!(updated.updated_at >= user.updated_at);

        let stored = db.find_by_username("anil1").unwrap().unwrap();
        assert_eq!(stored.name, "Anil Senocak");
        assert_eq!(stored.password_hash.as_deref(), Some("$argon2id$other"));
        assert_eq!(stored.email, user.email);
        assert_eq!(stored.roles, user.roles);
    }

    #[test]
    fn profile_update_leaves_absent_fields_untouched() {
        let db = db();
        db.insert_user(new_user(&db, "anil1", "anil1@x.com")).unwrap();

        db.update_profile("anil1", None, Some("$argon2id$h1".to_string()))
            .unwrap();
        db.update_profile("anil1", Some("Anil Senocak".to_string()), None)
            .unwrap();

        let stored = db.find_by_username("anil1").unwrap().unwrap();
        assert_eq!(stored.name, "Anil Senocak");
        assert_eq!(stored.password_hash.as_deref(), Some("$argon2id$h1"));
    }

    #[test]
    fn concurrent_profile_updates_keep_both_fields() {
        let db = db();
        db.insert_user(new_user(&db, "anil1", "anil1@x.com")).unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..20 {
                    db.update_profile("anil1", Some(format!("Name {i:02}")), None)
                        .unwrap();
                }
            });
            s.spawn(|| {
                for i in 0..20 {
                    db.update_profile("anil1", None, Some(format!("$argon2id$h{i:02}")))
                        .unwrap();
                }
            });
        });

        let stored = db.find_by_username("anil1").unwrap().unwrap();
        assert_eq!(stored.name, "Name 19");
        assert_eq!(stored.password_hash.as_deref(), Some("$argon2id$h19"));
    }

    #[test]
    fn profile_update_of_unknown_user_is_not_found() {
        let db = db();
        assert!(matches!(
            db.update_profile("ghost", Some("Ghost".to_string()), None),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn open_reports_unusable_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let err = UserDatabase::open(&blocker.join("users.redb")).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn ensure_role_is_idempotent() {
        let db = db();
        assert!(db.find_role(RoleName::Admin).unwrap().is_none());

        let first = db.ensure_role(RoleName::Admin).unwrap();
        let second = db.ensure_role(RoleName::Admin).unwrap();
        assert_eq!(first, second);
        assert_eq!(db.find_role(RoleName::Admin).unwrap(), Some(first));
    }

    #[test]
    fn data_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db").join("users.redb");

        {
            let db = UserDatabase::open(&path).unwrap();
            db.insert_user(new_user(&db, "anil1", "anil1@x.com")).unwrap();
        }

        let db = UserDatabase::open(&path).unwrap();
        db.health_check().unwrap();
        assert_eq!(db.count_users().unwrap(), 1);
        assert!(db.find_role(RoleName::User).unwrap().is_some());
    }
}
