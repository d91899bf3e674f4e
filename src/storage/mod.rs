// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Filesystem-backed persistence.
//!
//! `fs` provides atomic JSON file IO under a single data directory, `paths`
//! owns the directory layout, and `repository` offers typed access to wallet
//! records and the funding ledger.

pub mod fs;
pub mod paths;
pub mod repository;

pub use fs::{Storage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    FundingLedgerEntry, FundingRepository, FundingStatus, WalletRecord, WalletRepository,
};
