// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Wallet lookup/creation and balance endpoints.

use axum::{extract::State, Json};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{BalanceResponse, WalletResponse};
use crate::state::AppState;
use crate::storage::{WalletRecord, WalletRepository};

/// Get the caller's wallet, creating it at the custody service on first call.
///
/// The custody lookup is idempotent per email, so repeated sign-ins return
/// the same wallet. When a wallet is newly created, initial funding is
/// started in the background; its outcome never affects this response.
#[utoipa::path(
    get,
    path = "/v1/wallet",
    tag = "Wallet",
    security(("bearer" = [])),
    responses(
        (status = 200, body = WalletResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 502, description = "Custody service failure")
    )
)]
pub async fn get_wallet(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<WalletResponse>, ApiError> {
    let wallet = state.custody.get_or_create_wallet(&user.email).await?;

    // Serialize against webhook events touching the same wallet record.
    let _guard = state.wallet_locks.acquire(&wallet.wallet_id).await;

    let record = WalletRepository::new(&state.storage).upsert(WalletRecord::new(
        &user.user_id,
        &wallet.wallet_id,
        &wallet.account_address,
        &wallet.public_key_hex,
        &wallet.chain,
        wallet.external_key_shares.clone(),
    ))?;

    if wallet.is_new {
        let orchestrator = state.funding_orchestrator();
        let user_id = user.user_id.clone();
        let address = record.account_address.clone();
        tokio::spawn(async move {
            let outcome = orchestrator.fund_new_wallet(&user_id, &address).await;
            tracing::debug!(user_id = %user_id, ?outcome, "initial funding finished");
        });
    }

    Ok(Json(WalletResponse {
        address: record.account_address,
        wallet_id: record.wallet_id,
        is_new: wallet.is_new,
    }))
}

/// Native balance of the caller's wallet.
#[utoipa::path(
    get,
    path = "/v1/wallet/balance",
    tag = "Wallet",
    security(("bearer" = [])),
    responses(
        (status = 200, body = BalanceResponse),
        (status = 404, description = "No wallet on file")
    )
)]
pub async fn get_balance(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let record = WalletRepository::new(&state.storage)
        .find(&user.user_id)?
        .ok_or_else(|| {
            ApiError::not_found("wallet_not_found", "no wallet on file for this user")
        })?;

    let chain = state.dispatcher.chain();
    let balance = chain
        .get_balance(&record.account_address)
        .await
        .map_err(|e| ApiError::service_unavailable("relay_unavailable", e.to_string()))?;

    Ok(Json(BalanceResponse {
        address: record.account_address,
        balance_wei: balance.to_string(),
        network: chain.network().name.to_string(),
    }))
}
