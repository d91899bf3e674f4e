// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::{Config, ConfigError};
use crate::custody::CustodyClient;
use crate::funding::{FundingConfig, FundingOrchestrator};
use crate::relay::{ChainClient, Dispatcher, RelayClient, BASE_SEPOLIA};
use crate::storage::{Storage, StorageError};

/// Per-wallet async mutexes serializing webhook event application.
///
/// Events for different wallets process concurrently; events for the same
/// wallet are applied one at a time in arrival order.
#[derive(Clone, Default)]
pub struct WalletLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a wallet key, creating it on first use.
    pub async fn acquire(&self, key: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("client construction failed: {0}")]
    Client(String),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<Storage>,
    pub custody: CustodyClient,
    pub dispatcher: Arc<Dispatcher>,
    pub wallet_locks: WalletLocks,
}

impl AppState {
    /// Wire up all shared services from resolved configuration.
    ///
    /// Storage must already be initialized.
    pub fn from_config(config: Config, storage: Storage) -> Result<Self, StateError> {
        let custody = CustodyClient::new(
            &config.custody_api_base,
            &config.custody_environment_id,
            &config.custody_auth_token,
        )
        .map_err(|e| StateError::Client(e.to_string()))?;

        let relay = RelayClient::new(&config.custody_api_base, &config.custody_environment_id)
            .map_err(|e| StateError::Client(e.to_string()))?;

        let chain = ChainClient::new(BASE_SEPOLIA, &config.chain_rpc_url)
            .map_err(|e| StateError::Client(e.to_string()))?;

        let dispatcher = Arc::new(Dispatcher::new(
            custody.clone(),
            relay,
            chain,
            config.confirmation_timeout,
        ));

        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            custody,
            dispatcher,
            wallet_locks: WalletLocks::new(),
        })
    }

    /// Funding orchestrator bound to this state's dispatcher and storage.
    pub fn funding_orchestrator(&self) -> FundingOrchestrator<Dispatcher> {
        FundingOrchestrator::new(
            self.dispatcher.clone(),
            self.storage.clone(),
            FundingConfig {
                enabled: self.config.funding_enabled,
                amount_wei: self.config.funding_amount_wei,
                source_user_id: self.config.funding_wallet_user_id.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wallet_locks_serialize_per_key() {
        let locks = WalletLocks::new();
        let first = locks.acquire("w-1").await;

        // A second acquire for the same key must block until released.
        let locks2 = locks.clone();
        let contended = tokio::spawn(async move {
            let _guard = locks2.acquire("w-1").await;
        });
        tokio::task::yield_now().await;
        assert!(!contended.is_finished());

        // A different key is independent.
        let _other = locks.acquire("w-2").await;

        drop(first);
        contended.await.unwrap();
    }
}
