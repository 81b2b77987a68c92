// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

/// Unauthenticated connectivity check.
#[utoipa::path(
    get,
    path = "/public/ping",
    tag = "Public",
    responses(
        (status = 200, description = "Pong", body = String)
    )
)]
pub async fn ping() -> &'static str {
    "ping"
}
