// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Sponsored transaction submission.

use axum::{extract::State, Json};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{SendTransactionRequest, SendTransactionResponse};
use crate::relay::{ConfirmationPolicy, SponsoredDispatch, SponsoredTxRequest};
use crate::signing;
use crate::state::AppState;
use crate::storage::WalletRepository;

/// Submit a gas-sponsored transaction from the caller's wallet.
///
/// The sender is always the wallet on file for the authenticated user; the
/// `walletAddress` field must match it, so a stale frontend cannot submit
/// from an address the user no longer controls.
#[utoipa::path(
    post,
    path = "/v1/transactions/send",
    request_body = SendTransactionRequest,
    tag = "Transactions",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SendTransactionResponse),
        (status = 400, description = "Malformed transaction"),
        (status = 404, description = "No wallet on file"),
        (status = 409, description = "No signing material available"),
        (status = 422, description = "Sponsorship or balance refused"),
        (status = 502, description = "Relay rejected the transaction"),
        (status = 503, description = "Relay unreachable")
    )
)]
pub async fn send_transaction(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<SendTransactionRequest>,
) -> Result<Json<SendTransactionResponse>, ApiError> {
    let record = WalletRepository::new(&state.storage)
        .find(&user.user_id)?
        .ok_or_else(|| {
            ApiError::not_found("wallet_not_found", "no wallet on file for this user")
        })?;

    if !record
        .account_address
        .eq_ignore_ascii_case(&request.wallet_address)
    {
        return Err(ApiError::bad_request(
            "wallet_mismatch",
            "walletAddress does not match the wallet on file",
        ));
    }

    let signing = signing::resolve(&record)?;

    let result = state
        .dispatcher
        .dispatch(
            SponsoredTxRequest {
                wallet_id: record.wallet_id.clone(),
                from_address: record.account_address.clone(),
                to: request.to,
                value_wei: request.value,
                call_data: request.data,
            },
            signing,
            ConfirmationPolicy::SubmitOnly,
        )
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        transaction_hash = %result.transaction_hash,
        "sponsored transaction submitted"
    );

    Ok(Json(SendTransactionResponse {
        success: result.success,
        transaction_hash: result.transaction_hash,
    }))
}
