// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Read-side JSON-RPC client for the operating chain.

use std::str::FromStr;
use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::{Address, TxHash, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionReceipt,
};

use super::types::NetworkConfig;

/// HTTP provider type with the default fillers.
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidHash(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("timed out waiting for inclusion of {0}")]
    ConfirmationTimeout(String),
}

/// JSON-RPC client for balance reads and receipt polling.
#[derive(Debug)]
pub struct ChainClient {
    network: NetworkConfig,
    provider: HttpProvider,
}

impl ChainClient {
    pub fn new(network: NetworkConfig, rpc_url: &str) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { network, provider })
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Native balance in wei.
    pub async fn get_balance(&self, address: &str) -> Result<U256, ChainError> {
        let addr = Address::from_str(address)
            .map_err(|e| ChainError::InvalidAddress(e.to_string()))?;
        self.provider
            .get_balance(addr)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    /// Poll for a transaction receipt until inclusion or the timeout expires.
    pub async fn wait_for_inclusion(
        &self,
        transaction_hash: &str,
        timeout: Duration,
    ) -> Result<TransactionReceipt, ChainError> {
        let hash = TxHash::from_str(transaction_hash)
            .map_err(|e| ChainError::InvalidHash(e.to_string()))?;

        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => {}
                    Err(e) => return Err(ChainError::Rpc(e.to_string())),
                }
                tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| ChainError::ConfirmationTimeout(transaction_hash.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::types::BASE_SEPOLIA;

    #[test]
    fn constructs_for_default_network() {
        let client = ChainClient::new(BASE_SEPOLIA, BASE_SEPOLIA.default_rpc_url).unwrap();
        assert_eq!(client.network().chain_id, 84532);
    }

    #[test]
    fn rejects_bad_rpc_url() {
        assert!(matches!(
            ChainClient::new(BASE_SEPOLIA, "not a url").unwrap_err(),
            ChainError::InvalidRpcUrl(_)
        ));
    }
}
