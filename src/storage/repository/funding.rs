// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Funding ledger.
//!
//! Append-style record of every initial-funding attempt. Entries start
//! `pending` and move to exactly one terminal state (`success` or `failed`);
//! terminal entries are immutable and never deleted, so the ledger remains a
//! complete audit trail of value leaving the funding wallet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::fs::{Storage, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundingStatus {
    Pending,
    Success,
    Failed,
}

/// One funding attempt, pending or settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingLedgerEntry {
    pub entry_id: Uuid,
    /// Funding-source wallet address.
    pub from_address: String,
    /// Newly created wallet being funded.
    pub to_address: String,
    /// User id the destination wallet belongs to.
    pub to_user_id: String,
    /// Amount in wei, as a decimal string.
    pub amount_wei: String,
    pub status: FundingStatus,
    pub transaction_hash: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File-backed repository for [`FundingLedgerEntry`]s.
pub struct FundingRepository<'a> {
    storage: &'a Storage,
}

impl<'a> FundingRepository<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a funding attempt before the transfer is dispatched.
    pub fn create_pending(
        &self,
        from_address: &str,
        to_address: &str,
        to_user_id: &str,
        amount_wei: &str,
    ) -> StorageResult<FundingLedgerEntry> {
        let now = Utc::now();
        let entry = FundingLedgerEntry {
            entry_id: Uuid::new_v4(),
            from_address: from_address.to_string(),
            to_address: to_address.to_string(),
            to_user_id: to_user_id.to_string(),
            amount_wei: amount_wei.to_string(),
            status: FundingStatus::Pending,
            transaction_hash: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        self.write(&entry)?;
        Ok(entry)
    }

    /// Record a failure without a preceding pending entry, e.g. when the
    /// funding wallet balance check refuses the transfer before dispatch.
    pub fn create_failed(
        &self,
        from_address: &str,
        to_address: &str,
        to_user_id: &str,
        amount_wei: &str,
        error_message: &str,
    ) -> StorageResult<FundingLedgerEntry> {
        let mut entry =
            self.create_pending(from_address, to_address, to_user_id, amount_wei)?;
        entry.status = FundingStatus::Failed;
        entry.error_message = Some(error_message.to_string());
        entry.updated_at = Utc::now();
        self.write(&entry)?;
        Ok(entry)
    }

    pub fn get(&self, entry_id: Uuid) -> StorageResult<FundingLedgerEntry> {
        let path = self.storage.paths().funding_entry(&entry_id.to_string());
        self.storage.read_json(&path)
    }

    /// Settle a pending entry as confirmed on-chain.
    pub fn mark_success(
        &self,
        entry_id: Uuid,
        transaction_hash: &str,
    ) -> StorageResult<FundingLedgerEntry> {
        self.settle(entry_id, |entry| {
            entry.status = FundingStatus::Success;
            entry.transaction_hash = Some(transaction_hash.to_string());
        })
    }

    /// Settle a pending entry as failed with a reason.
    pub fn mark_failed(
        &self,
        entry_id: Uuid,
        error_message: &str,
    ) -> StorageResult<FundingLedgerEntry> {
        self.settle(entry_id, |entry| {
            entry.status = FundingStatus::Failed;
            entry.error_message = Some(error_message.to_string());
        })
    }

    fn settle(
        &self,
        entry_id: Uuid,
        apply: impl FnOnce(&mut FundingLedgerEntry),
    ) -> StorageResult<FundingLedgerEntry> {
        let mut entry = self.get(entry_id)?;
        if entry.status != FundingStatus::Pending {
            return Err(StorageError::Conflict(format!(
                "funding entry {entry_id} already settled as {:?}",
                entry.status
            )));
        }
        apply(&mut entry);
        entry.updated_at = Utc::now();
        self.write(&entry)?;
        Ok(entry)
    }

    fn write(&self, entry: &FundingLedgerEntry) -> StorageResult<()> {
        let path = self
            .storage
            .paths()
            .funding_entry(&entry.entry_id.to_string());
        self.storage.write_json(&path, entry)
    }
}
