// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use paylane_server::api::router;
use paylane_server::config::Config;
use paylane_server::state::AppState;
use paylane_server::storage::{Storage, StoragePaths};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env().expect("Failed to load configuration");

    let mut storage = Storage::new(StoragePaths::new(&config.data_dir));
    storage.initialize().expect("Failed to initialize storage");

    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .expect("Failed to parse bind address");
    let state = AppState::from_config(config, storage).expect("Failed to build application state");
    let app = router(state);

    tracing::info!(%addr, "Paylane server listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
