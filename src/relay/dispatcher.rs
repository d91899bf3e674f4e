// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Sponsored transaction dispatch.
//!
//! Dispatch is a pipeline: validate caller input, resolve a custody session,
//! submit through the relay, and (optionally) wait for on-chain inclusion.
//! Validation is pure and always runs first, so malformed requests are
//! rejected before any session or relay traffic happens.

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use tokio::sync::OnceCell;

use crate::custody::{CustodyClient, CustodyError, CustodySession};
use crate::signing::SigningConfig;

use super::chain::{ChainClient, ChainError};
use super::client::{RelayClient, RelayError};
use super::types::{ConfirmationPolicy, SponsoredTxRequest, SponsoredTxResult, ValidatedTx};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid transaction: {0}")]
    Validation(String),

    #[error("relay unavailable: {0}")]
    RelayUnavailable(String),

    #[error("sponsorship refused: {0}")]
    InsufficientSponsorship(String),

    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Custody(#[from] CustodyError),
}

/// Seam between callers (transaction endpoint, funding orchestrator) and the
/// concrete relay plumbing. Test doubles implement this to exercise callers
/// without network access.
pub trait SponsoredDispatch {
    fn dispatch(
        &self,
        request: SponsoredTxRequest,
        signing: SigningConfig,
        policy: ConfirmationPolicy,
    ) -> impl std::future::Future<Output = Result<SponsoredTxResult, DispatchError>> + Send;

    fn native_balance(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<U256, DispatchError>> + Send;
}

/// Validate a raw request into parsed on-chain types.
///
/// Rules: both addresses must parse, the value must be a strictly positive
/// decimal wei amount, and call data (when present) must be 0x-prefixed hex.
pub fn validate(request: &SponsoredTxRequest) -> Result<ValidatedTx, DispatchError> {
    let from_address = Address::from_str(&request.from_address)
        .map_err(|_| DispatchError::Validation(format!("invalid from address: {}", request.from_address)))?;
    let to = Address::from_str(&request.to)
        .map_err(|_| DispatchError::Validation(format!("invalid to address: {}", request.to)))?;

    let value = U256::from_str_radix(&request.value_wei, 10)
        .map_err(|_| DispatchError::Validation(format!("invalid wei amount: {}", request.value_wei)))?;
    if value.is_zero() {
        return Err(DispatchError::Validation(
            "transaction value must be greater than zero".into(),
        ));
    }

    let call_data = match &request.call_data {
        None => None,
        Some(data) => {
            let stripped = data
                .strip_prefix("0x")
                .ok_or_else(|| DispatchError::Validation("call data must be 0x-prefixed".into()))?;
            Some(
                hex::decode(stripped)
                    .map_err(|_| DispatchError::Validation("call data is not valid hex".into()))?,
            )
        }
    };

    Ok(ValidatedTx {
        wallet_id: request.wallet_id.clone(),
        from_address,
        to,
        value,
        call_data,
    })
}

/// Map a relay error string onto a dispatch error by its content.
///
/// The relay reports failures as free text, so classification is by
/// substring: sponsorship/paymaster refusals, balance shortfalls, and
/// connectivity problems each get their own category; anything else is a
/// plain rejection.
pub fn classify_relay_error(text: &str) -> DispatchError {
    let lower = text.to_lowercase();
    if lower.contains("sponsorship") || lower.contains("paymaster") {
        DispatchError::InsufficientSponsorship(text.to_string())
    } else if lower.contains("insufficient") {
        DispatchError::InsufficientBalance(text.to_string())
    } else if lower.contains("timeout") || lower.contains("timed out") || lower.contains("connect")
    {
        DispatchError::RelayUnavailable(text.to_string())
    } else {
        DispatchError::Rejected(text.to_string())
    }
}

/// Production dispatcher wired to the custody relay and chain RPC.
pub struct Dispatcher {
    custody: CustodyClient,
    relay: RelayClient,
    chain: ChainClient,
    session: OnceCell<CustodySession>,
    confirmation_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        custody: CustodyClient,
        relay: RelayClient,
        chain: ChainClient,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            custody,
            relay,
            chain,
            session: OnceCell::new(),
            confirmation_timeout,
        }
    }

    pub fn chain(&self) -> &ChainClient {
        &self.chain
    }

    /// Authenticate once and reuse the session for subsequent dispatches.
    async fn session(&self) -> Result<&CustodySession, DispatchError> {
        self.session
            .get_or_try_init(|| self.custody.authenticate())
            .await
            .map_err(DispatchError::from)
    }
}

impl SponsoredDispatch for Dispatcher {
    async fn dispatch(
        &self,
        request: SponsoredTxRequest,
        signing: SigningConfig,
        policy: ConfirmationPolicy,
    ) -> Result<SponsoredTxResult, DispatchError> {
        let tx = validate(&request)?;
        let session = self.session().await?;

        let result = match self
            .relay
            .submit(&session.jwt, self.chain.network().chain_id, &tx, &signing)
            .await
        {
            Ok(result) => result,
            Err(RelayError::Api { body, .. }) => return Err(classify_relay_error(&body)),
            Err(RelayError::Http(err)) => {
                return Err(DispatchError::RelayUnavailable(err.to_string()))
            }
            Err(other) => return Err(DispatchError::Rejected(other.to_string())),
        };

        match policy {
            ConfirmationPolicy::SubmitOnly => Ok(result),
            ConfirmationPolicy::WaitForInclusion => {
                let receipt = self
                    .chain
                    .wait_for_inclusion(&result.transaction_hash, self.confirmation_timeout)
                    .await
                    .map_err(|err| match err {
                        ChainError::ConfirmationTimeout(hash) => DispatchError::RelayUnavailable(
                            format!("confirmation timed out for {hash}"),
                        ),
                        other => DispatchError::RelayUnavailable(other.to_string()),
                    })?;
                Ok(SponsoredTxResult {
                    success: receipt.status(),
                    ..result
                })
            }
        }
    }

    async fn native_balance(&self, address: &str) -> Result<U256, DispatchError> {
        self.chain
            .get_balance(address)
            .await
            .map_err(|err| DispatchError::RelayUnavailable(err.to_string()))
    }
}
