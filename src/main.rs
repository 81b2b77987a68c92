// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use auth_service::{
    api::router,
    auth::{PasswordHasher, TokenService},
    config::{AppConfig, DEFAULT_LOG_FILTER},
    state::AppState,
    storage::{database_path, user_database::UserDatabase},
};
use axum_server::Handle;
use tracing_subscriber::EnvFilter;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.json_logs);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(?config, "Starting auth service");

    std::fs::create_dir_all(&config.data_dir)?;
    let db_path = database_path(&config.data_dir);
    let database = UserDatabase::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "Credential store opened");

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
    let passwords = PasswordHasher::new(config.hashing)?;
    let state = AppState::new(Arc::new(database), tokens, passwords);

    state.seed_roles()?;
    if let Some(admin) = &config.seed_admin {
        if state.seed_admin(admin)? {
            tracing::info!(username = %admin.username, "Seeded admin user");
        }
    }

    let app = router(state);
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    tracing::info!(addr = %config.bind_addr, "Auth service listening (docs at /docs)");
    axum_server::bind(config.bind_addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!("Auth service stopped");
    Ok(())
}

async fn shutdown_signal(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
