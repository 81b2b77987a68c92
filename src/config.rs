// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup by [`AppConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the user database | `./data` |
//! | `JWT_SECRET` | HMAC secret used to sign bearer tokens | Required |
//! | `JWT_EXPIRATION_MS` | Token lifetime in milliseconds (at most 5 years) | `3600000` |
//! | `PASSWORD_HASH_MEMORY_KIB` | Argon2 memory cost | `19456` |
//! | `PASSWORD_HASH_ITERATIONS` | Argon2 passes | `2` |
//! | `PASSWORD_HASH_PARALLELISM` | Argon2 lanes | `1` |
//! | `SEED_ADMIN_USERNAME` | Admin account created at startup | Optional |
//! | `SEED_ADMIN_EMAIL` | Email of the seeded admin | Optional |
//! | `SEED_ADMIN_PASSWORD` | Password of the seeded admin | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::HashingConfig;

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// The redb database file `users.redb` is created inside it.
///
/// # Default
/// `./data`
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the token signing secret.
///
/// Every instance verifying tokens must share the same value. Startup fails
/// when it is unset or shorter than [`MIN_SECRET_LEN`] bytes.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable name for the token lifetime (milliseconds).
pub const JWT_EXPIRATION_MS_ENV: &str = "JWT_EXPIRATION_MS";

pub const PASSWORD_HASH_MEMORY_KIB_ENV: &str = "PASSWORD_HASH_MEMORY_KIB";
pub const PASSWORD_HASH_ITERATIONS_ENV: &str = "PASSWORD_HASH_ITERATIONS";
pub const PASSWORD_HASH_PARALLELISM_ENV: &str = "PASSWORD_HASH_PARALLELISM";

/// Environment variable names for the optional startup admin account.
///
/// All three must be set for the account to be created.
pub const SEED_ADMIN_USERNAME_ENV: &str = "SEED_ADMIN_USERNAME";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

/// Environment variable name for the log output format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_JWT_EXPIRATION_MS: i64 = 3_600_000;
/// Longest accepted token lifetime: 5 years.
pub const MAX_JWT_EXPIRATION_MS: i64 = 5 * 365 * 24 * 3_600_000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Minimum accepted length of `JWT_SECRET` in bytes (HS256 key size).
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("JWT_SECRET must be at least 32 bytes")]
    SecretTooShort,

    #[error("SEED_ADMIN_USERNAME, SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together")]
    PartialAdminSeed,
}

/// Admin account created at startup when configured.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Fully resolved runtime configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub jwt_secret: Vec<u8>,
    pub token_ttl: chrono::Duration,
    pub hashing: HashingConfig,
    pub seed_admin: Option<SeedAdmin>,
    pub json_logs: bool,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(&get, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr = format!("{host}:{port}").parse().map_err(|_| {
            ConfigError::Invalid {
                var: HOST_ENV,
                value: host.clone(),
            }
        })?;

        let jwt_secret = get(JWT_SECRET_ENV)
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?
            .into_bytes();
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort);
        }

        let ttl_ms: i64 = parse_or(&get, JWT_EXPIRATION_MS_ENV, DEFAULT_JWT_EXPIRATION_MS)?;
        if ttl_ms <= 0 || ttl_ms > MAX_JWT_EXPIRATION_MS {
            return Err(ConfigError::Invalid {
                var: JWT_EXPIRATION_MS_ENV,
                value: ttl_ms.to_string(),
            });
        }

        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: parse_or(&get, PASSWORD_HASH_MEMORY_KIB_ENV, defaults.memory_kib)?,
            iterations: parse_or(&get, PASSWORD_HASH_ITERATIONS_ENV, defaults.iterations)?,
            parallelism: parse_or(&get, PASSWORD_HASH_PARALLELISM_ENV, defaults.parallelism)?,
        };

        let seed_admin = match (
            get(SEED_ADMIN_USERNAME_ENV),
            get(SEED_ADMIN_EMAIL_ENV),
            get(SEED_ADMIN_PASSWORD_ENV),
        ) {
            (Some(username), Some(email), Some(password)) => Some(SeedAdmin {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::PartialAdminSeed),
        };

        let json_logs = get(LOG_FORMAT_ENV).is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            jwt_secret,
            token_ttl: chrono::Duration::milliseconds(ttl_ms),
            hashing,
            seed_admin,
            json_logs,
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field("token_ttl", &self.token_ttl)
            .field("hashing", &self.hashing)
            .field("seed_admin", &self.seed_admin)
            .field("json_logs", &self.json_logs)
            .finish_non_exhaustive()
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[(JWT_SECRET_ENV, SECRET)]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.token_ttl, chrono::Duration::hours(1));
        assert_eq!(config.hashing, HashingConfig::default());
        assert!(config.seed_admin.is_none());
        assert!(!config.json_logs);
    }

    #[test]
    fn secret_is_required_and_sized() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing(JWT_SECRET_ENV));
        assert_eq!(
            load(&[(JWT_SECRET_ENV, "short")]).unwrap_err(),
            ConfigError::SecretTooShort
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (JWT_SECRET_ENV, SECRET),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (JWT_EXPIRATION_MS_ENV, "60000"),
            (PASSWORD_HASH_MEMORY_KIB_ENV, "4096"),
            (LOG_FORMAT_ENV, "JSON"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.token_ttl, chrono::Duration::minutes(1));
        assert_eq!(config.hashing.memory_kib, 4096);
        assert!(config.json_logs);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = load(&[(JWT_SECRET_ENV, SECRET), (PORT_ENV, "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: PORT_ENV,
                value: "eighty".to_string()
            }
        );

        let err = load(&[(JWT_SECRET_ENV, SECRET), (JWT_EXPIRATION_MS_ENV, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: JWT_EXPIRATION_MS_ENV, .. }));
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let err = load(&[
            (JWT_SECRET_ENV, SECRET),
            (JWT_EXPIRATION_MS_ENV, "9000000000000000"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: JWT_EXPIRATION_MS_ENV,
                value: "9000000000000000".to_string()
            }
        );

        let max = MAX_JWT_EXPIRATION_MS.to_string();
        let config = load(&[(JWT_SECRET_ENV, SECRET), (JWT_EXPIRATION_MS_ENV, max.as_str())]).unwrap();
        assert_eq!(config.token_ttl, chrono::Duration::days(5 * 365));
    }

    #[test]
    fn seed_admin_needs_all_three_values() {
        let config = load(&[
            (JWT_SECRET_ENV, SECRET),
            (SEED_ADMIN_USERNAME_ENV, "root"),
            (SEED_ADMIN_EMAIL_ENV, "root@x.com"),
            (SEED_ADMIN_PASSWORD_ENV, "rootpass"),
        ])
        .unwrap();
        assert_eq!(config.seed_admin.as_ref().map(|a| a.username.as_str()), Some("root"));
        assert!(!format!("{config:?}").contains("rootpass"));

        assert_eq!(
            load(&[(JWT_SECRET_ENV, SECRET), (SEED_ADMIN_USERNAME_ENV, "root")]).unwrap_err(),
            ConfigError::PartialAdminSeed
        );
    }
}
