// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth Service - User Registration and JWT Authentication
//!
//! This crate provides a REST service that registers users, authenticates
//! them with username and password, and issues HS256 bearer tokens gating
//! role-protected endpoints.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Tokens, password hashing, security context and route policies
//! - `config` - Environment configuration
//! - `storage` - Credential store (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod validation;
