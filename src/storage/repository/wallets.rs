// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Wallet credential store.
//!
//! One JSON record per user, keyed by the authenticated user's subject id.
//! Records accumulate signing material over time: the custody wallet-creation
//! response may ship external key shares immediately, and a later delegation
//! webhook upgrades the record to delegated material. Records are never
//! deleted — a delegation revoke downgrades, it does not erase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signing::{DelegatedMaterial, KeyShare, SigningMaterial};
use crate::storage::fs::{Storage, StorageError, StorageResult};

/// A user's wallet credentials and current signing material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Authenticated user id this wallet belongs to.
    pub user_id: String,
    /// Custody-service wallet id.
    pub wallet_id: String,
    /// On-chain account address (EIP-55 form as returned by custody).
    pub account_address: String,
    /// Hex-encoded wallet public key.
    pub public_key_hex: String,
    /// Chain identifier reported by custody (e.g. "EVM").
    pub chain: String,
    /// External server key shares retained even while a delegation is active,
    /// so a revoke can fall back to them.
    #[serde(default)]
    pub external_key_shares: Vec<KeyShare>,
    pub signing_material: SigningMaterial,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletRecord {
    pub fn new(
        user_id: impl Into<String>,
        wallet_id: impl Into<String>,
        account_address: impl Into<String>,
        public_key_hex: impl Into<String>,
        chain: impl Into<String>,
        external_key_shares: Vec<KeyShare>,
    ) -> Self {
        let now = Utc::now();
        let signing_material = if external_key_shares.is_empty() {
            SigningMaterial::Unresolved
        } else {
            SigningMaterial::ExternalKeyShares {
                shares: external_key_shares.clone(),
            }
        };
        Self {
            user_id: user_id.into(),
            wallet_id: wallet_id.into(),
            account_address: account_address.into(),
            public_key_hex: public_key_hex.into(),
            chain: chain.into(),
            external_key_shares,
            signing_material,
            created_at: now,
            updated_at: now,
        }
    }
}

/// File-backed repository for [`WalletRecord`]s.
pub struct WalletRepository<'a> {
    storage: &'a Storage,
}

impl<'a> WalletRepository<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Fetch a record, or `None` when the user has no wallet yet.
    pub fn find(&self, user_id: &str) -> StorageResult<Option<WalletRecord>> {
        let path = self.storage.paths().wallet_record(user_id);
        match self.storage.read_json::<WalletRecord>(&path) {
            Ok(record) => Ok(Some(record)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Fetch a record, failing with [`StorageError::NotFound`] on a miss.
    pub fn get(&self, user_id: &str) -> StorageResult<WalletRecord> {
        self.find(user_id)?
            .ok_or_else(|| StorageError::NotFound(format!("wallet for user {user_id}")))
    }

    /// Insert or refresh a record after a custody wallet lookup.
    ///
    /// Idempotent for repeated sign-ins: a second upsert for the same user
    /// refreshes custody-sourced fields but preserves `created_at` and any
    /// delegated material a webhook already installed.
    pub fn upsert(&self, incoming: WalletRecord) -> StorageResult<WalletRecord> {
        let record = match self.find(&incoming.user_id)? {
            Some(existing) => {
                let external_key_shares = if incoming.external_key_shares.is_empty() {
                    existing.external_key_shares
                } else {
                    incoming.external_key_shares
                };
                let signing_material = match existing.signing_material {
                    delegated @ SigningMaterial::Delegated(_) => delegated,
                    _ if !external_key_shares.is_empty() => SigningMaterial::ExternalKeyShares {
                        shares: external_key_shares.clone(),
                    },
                    _ => SigningMaterial::Unresolved,
                };
                WalletRecord {
                    external_key_shares,
                    signing_material,
                    created_at: existing.created_at,
                    updated_at: Utc::now(),
                    ..incoming
                }
            }
            None => incoming,
        };
        self.write(&record)?;
        Ok(record)
    }

    /// Install delegated signing material from a verified delegation event.
    pub fn set_delegated(
        &self,
        user_id: &str,
        material: DelegatedMaterial,
    ) -> StorageResult<WalletRecord> {
        let mut record = self.get(user_id)?;
        record.signing_material = SigningMaterial::Delegated(material);
        record.updated_at = Utc::now();
        self.write(&record)?;
        Ok(record)
    }

    /// Remove delegated signing material after a revocation event.
    ///
    /// Falls back to external key shares when the record still holds any,
    /// otherwise the wallet becomes unresolved. A revoke for a user with no
    /// record (revoke delivered before create, or a user this service never
    /// saw) is a no-op.
    pub fn clear_delegated(&self, user_id: &str) -> StorageResult<Option<WalletRecord>> {
        let Some(mut record) = self.find(user_id)? else {
            return Ok(None);
        };
        record.signing_material = if record.external_key_shares.is_empty() {
            SigningMaterial::Unresolved
        } else {
            SigningMaterial::ExternalKeyShares {
                shares: record.external_key_shares.clone(),
            }
        };
        record.updated_at = Utc::now();
        self.write(&record)?;
        Ok(Some(record))
    }

    fn write(&self, record: &WalletRecord) -> StorageResult<()> {
        let path = self.storage.paths().wallet_record(&record.user_id);
        self.storage.write_json(&path, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fs::Storage;
    use crate::storage::paths::StoragePaths;
    use tempfile::TempDir;

    fn storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (dir, storage)
    }

    fn share(secret: &str) -> KeyShare {
        KeyShare {
            pubkey: serde_json::json!({}),
            secret_share: secret.to_string(),
        }
    }

    fn delegated() -> DelegatedMaterial {
        DelegatedMaterial {
            key_share: "dk".into(),
            wallet_api_key: "api".into(),
            public_key: "0x04".into(),
            chain: "EVM".into(),
        }
    }

    fn record(user: &str, shares: Vec<KeyShare>) -> WalletRecord {
        WalletRecord::new(user, "w-1", "0xabc", "0x04aa", "EVM", shares)
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let (_dir, storage) = storage();
        let repo = WalletRepository::new(&storage);

        let stored = repo.upsert(record("alice", vec![share("s1")])).unwrap();
        let fetched = repo.get("alice").unwrap();
        assert_eq!(stored, fetched);
        assert!(matches!(
            fetched.signing_material,
            SigningMaterial::ExternalKeyShares { .. }
        ));
    }

    #[test]
    fn find_missing_returns_none() {
        let (_dir, storage) = storage();
        let repo = WalletRepository::new(&storage);
        assert!(repo.find("nobody").unwrap().is_none());
        assert!(matches!(
            repo.get("nobody").unwrap_err(),
            StorageError::NotFound(_)
        ));
    }

    #[test]
    fn upsert_preserves_created_at_and_delegation() {
        let (_dir, storage) = storage();
        let repo = WalletRepository::new(&storage);

        let first = repo.upsert(record("bob", vec![share("s1")])).unwrap();
        repo.set_delegated("bob", delegated()).unwrap();

        let second = repo.upsert(record("bob", vec![share("s2")])).unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(matches!(
            second.signing_material,
            SigningMaterial::Delegated(_)
        ));
        assert_eq!(second.external_key_shares[0].secret_share, "s2");
    }

    #[test]
    fn upsert_without_shares_keeps_existing_shares() {
        let (_dir, storage) = storage();
        let repo = WalletRepository::new(&storage);

        repo.upsert(record("carol", vec![share("s1")])).unwrap();
        let refreshed = repo.upsert(record("carol", Vec::new())).unwrap();
        assert_eq!(refreshed.external_key_shares.len(), 1);
        assert!(matches!(
            refreshed.signing_material,
            SigningMaterial::ExternalKeyShares { .. }
        ));
    }

    #[test]
    fn revoke_falls_back_to_external_shares() {
        let (_dir, storage) = storage();
        let repo = WalletRepository::new(&storage);

        repo.upsert(record("dave", vec![share("s1")])).unwrap();
        repo.set_delegated("dave", delegated()).unwrap();

        let cleared = repo.clear_delegated("dave").unwrap().unwrap();
        assert!(matches!(
            cleared.signing_material,
            SigningMaterial::ExternalKeyShares { .. }
        ));
    }

    #[test]
    fn revoke_without_shares_becomes_unresolved() {
        let (_dir, storage) = storage();
        let repo = WalletRepository::new(&storage);

        repo.upsert(record("erin", Vec::new())).unwrap();
        repo.set_delegated("erin", delegated()).unwrap();

        let cleared = repo.clear_delegated("erin").unwrap().unwrap();
        assert_eq!(cleared.signing_material, SigningMaterial::Unresolved);
    }

    #[test]
    fn revoke_for_unknown_user_is_noop() {
        let (_dir, storage) = storage();
        let repo = WalletRepository::new(&storage);
        assert!(repo.clear_delegated("ghost").unwrap().is_none());
    }

    #[test]
    fn set_delegated_requires_existing_record() {
        let (_dir, storage) = storage();
        let repo = WalletRepository::new(&storage);
        assert!(matches!(
            repo.set_delegated("ghost", delegated()).unwrap_err(),
            StorageError::NotFound(_)
        ));
    }
}
