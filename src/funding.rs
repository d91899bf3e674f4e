// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Initial funding of newly created wallets.
//!
//! When auto-funding is enabled, every freshly created wallet receives a
//! fixed amount of native currency from a configured funding wallet. Funding
//! is strictly best-effort: it runs after wallet creation has already
//! succeeded, and no failure here may surface to the sign-in caller. Every
//! attempt is recorded in the funding ledger before dispatch.

use std::sync::Arc;

use alloy::primitives::U256;

use crate::relay::{ConfirmationPolicy, DispatchError, SponsoredDispatch, SponsoredTxRequest};
use crate::signing;
use crate::storage::{FundingRepository, Storage, WalletRepository};

/// Funding behavior, resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct FundingConfig {
    pub enabled: bool,
    /// Amount transferred per new wallet, in wei.
    pub amount_wei: U256,
    /// User id whose wallet record is the funding source.
    pub source_user_id: Option<String>,
}

/// What happened to a funding attempt. Informational only; callers log it
/// and move on.
#[derive(Debug, Clone, PartialEq)]
pub enum FundingOutcome {
    Disabled,
    Funded {
        transaction_hash: String,
        amount_wei: String,
    },
    Failed {
        reason: String,
    },
}

pub struct FundingOrchestrator<D> {
    dispatcher: Arc<D>,
    storage: Arc<Storage>,
    config: FundingConfig,
}

impl<D: SponsoredDispatch> FundingOrchestrator<D> {
    pub fn new(dispatcher: Arc<D>, storage: Arc<Storage>, config: FundingConfig) -> Self {
        Self {
            dispatcher,
            storage,
            config,
        }
    }

    /// Fund a newly created wallet.
    ///
    /// Never returns an error: every failure collapses into
    /// [`FundingOutcome::Failed`] so spawned callers have nothing to
    /// propagate.
    pub async fn fund_new_wallet(&self, user_id: &str, to_address: &str) -> FundingOutcome {
        if !self.config.enabled {
            return FundingOutcome::Disabled;
        }
        match self.try_fund(user_id, to_address).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                tracing::warn!(user_id = %user_id, %reason, "wallet funding failed");
                FundingOutcome::Failed { reason }
            }
        }
    }

    async fn try_fund(&self, user_id: &str, to_address: &str) -> Result<FundingOutcome, String> {
        let source_user_id = self
            .config
            .source_user_id
            .as_deref()
            .ok_or_else(|| "funding wallet is not configured".to_string())?;

        let wallets = WalletRepository::new(&self.storage);
        let source = wallets
            .find(source_user_id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("funding wallet record missing for {source_user_id}"))?;
        let signing = signing::resolve(&source)
            .map_err(|_| "funding wallet has no signing material".to_string())?;

        let amount = self.config.amount_wei;
        let ledger = FundingRepository::new(&self.storage);

        let balance = self
            .dispatcher
            .native_balance(&source.account_address)
            .await
            .map_err(|e| e.to_string())?;
        if balance < amount {
            let reason = format!(
                "funding wallet balance {balance} below required {amount}"
            );
            ledger
                .create_failed(
                    &source.account_address,
                    to_address,
                    user_id,
                    &amount.to_string(),
                    &reason,
                )
                .map_err(|e| e.to_string())?;
            return Err(reason);
        }

        let entry = ledger
            .create_pending(
                &source.account_address,
                to_address,
                user_id,
                &amount.to_string(),
            )
            .map_err(|e| e.to_string())?;

        let request = SponsoredTxRequest {
            wallet_id: source.wallet_id.clone(),
            from_address: source.account_address.clone(),
            to: to_address.to_string(),
            value_wei: amount.to_string(),
            call_data: None,
        };

        match self
            .dispatcher
            .dispatch(request, signing, ConfirmationPolicy::WaitForInclusion)
            .await
        {
            Ok(result) if result.success => {
                ledger
                    .mark_success(entry.entry_id, &result.transaction_hash)
                    .map_err(|e| e.to_string())?;
                tracing::info!(
                    user_id = %user_id,
                    transaction_hash = %result.transaction_hash,
                    "wallet funded"
                );
                Ok(FundingOutcome::Funded {
                    transaction_hash: result.transaction_hash,
                    amount_wei: amount.to_string(),
                })
            }
            Ok(result) => {
                let reason = format!("funding transaction reverted: {}", result.transaction_hash);
                ledger
                    .mark_failed(entry.entry_id, &reason)
                    .map_err(|e| e.to_string())?;
                Err(reason)
            }
            Err(err) => {
                let reason = funding_failure_reason(&err);
                ledger
                    .mark_failed(entry.entry_id, &reason)
                    .map_err(|e| e.to_string())?;
                Err(reason)
            }
        }
    }
}

fn funding_failure_reason(err: &DispatchError) -> String {
    match err {
        DispatchError::InsufficientSponsorship(msg) => format!("sponsorship refused: {msg}"),
        DispatchError::InsufficientBalance(msg) => format!("insufficient balance: {msg}"),
        other => other.to_string(),
    }
}
