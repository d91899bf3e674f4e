// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    pub checks: ReadyChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Data directory availability.
    pub data_dir: String,
    /// Whether delegation envelopes can be decrypted.
    pub delegation_key: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses((status = 200, body = ReadyResponse))
)]
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let data_dir = if state.config.data_dir.exists() {
        "ok"
    } else {
        "missing"
    };
    let delegation_key = if state.config.delegation_key.is_some() {
        "ok"
    } else {
        "not configured"
    };

    let status = if data_dir == "ok" { "ok" } else { "degraded" };

    Json(ReadyResponse {
        status: status.to_string(),
        checks: ReadyChecks {
            service: "ok".to_string(),
            data_dir: data_dir.to_string(),
            delegation_key: delegation_key.to_string(),
        },
    })
}
