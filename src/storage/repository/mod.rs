// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Typed repositories over the filesystem storage layer.

pub mod funding;
pub mod wallets;

pub use funding::{FundingLedgerEntry, FundingRepository, FundingStatus};
pub use wallets::{WalletRecord, WalletRepository};
