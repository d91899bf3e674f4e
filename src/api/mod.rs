// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        BalanceResponse, SendTransactionRequest, SendTransactionResponse, WalletResponse,
        WebhookAck,
    },
    state::AppState,
};

pub mod health;
pub mod jwks;
pub mod transactions;
pub mod wallet;
pub mod webhooks;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/balance", get(wallet::get_balance))
        .route("/transactions/send", post(transactions::send_transaction))
        .route(
            "/webhooks/custody/delegation",
            post(webhooks::delegation_webhook),
        );

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/.well-known/jwks.json", get(jwks::jwks))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::ready,
        jwks::jwks,
        wallet::get_wallet,
        wallet::get_balance,
        transactions::send_transaction,
        webhooks::delegation_webhook
    ),
    components(
        schemas(
            WalletResponse,
            BalanceResponse,
            SendTransactionRequest,
            SendTransactionResponse,
            WebhookAck,
            health::HealthResponse,
            health::ReadyResponse,
            health::ReadyChecks,
            jwks::JwkSet,
            jwks::Jwk
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Key material exposure"),
        (name = "Wallet", description = "Wallet issuance and balances"),
        (name = "Transactions", description = "Sponsored transaction submission"),
        (name = "Webhooks", description = "Custody delegation events")
    )
)]
struct ApiDoc;
