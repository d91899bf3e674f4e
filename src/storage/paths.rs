// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Storage path layout.
//!
//! ```text
//! {data_dir}/
//!   wallets/{user_key}.json   # Credential store, one record per user
//!   funding/{entry_id}.json   # Funding ledger (append-only audit trail)
//! ```

use std::path::{Path, PathBuf};

/// Computes all storage paths relative to a configurable root.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn wallets_dir(&self) -> PathBuf {
        self.root.join("wallets")
    }

    /// Path to a user's wallet record, keyed by user identity.
    ///
    /// One file per user enforces the 1:1 user-to-wallet invariant: an
    /// upsert for the same user always lands on the same path.
    pub fn wallet_record(&self, user_id: &str) -> PathBuf {
        self.wallets_dir().join(format!("{}.json", safe_key(user_id)))
    }

    pub fn funding_dir(&self) -> PathBuf {
        self.root.join("funding")
    }

    pub fn funding_entry(&self, entry_id: &str) -> PathBuf {
        self.funding_dir().join(format!("{}.json", safe_key(entry_id)))
    }
}

/// Sanitize an external identifier for use as a file name.
///
/// Custody user ids are UUID-like but come from an external system; anything
/// outside `[A-Za-z0-9._-]` is replaced so ids can never traverse paths.
fn safe_key(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
