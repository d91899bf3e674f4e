// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Signing material model and resolution.
//!
//! Every wallet record carries exactly one active [`SigningMaterial`]:
//!
//! - `external-key-shares`: threshold key shares held by the custody service,
//!   passed back as a parameter when requesting a signature.
//! - `delegated`: decrypted delegation materials received via webhook, which
//!   let this service sign on the user's behalf.
//! - `unresolved`: no usable material yet. Recoverable — a delegation event
//!   may still arrive — but any signing attempt must fail cleanly.
//!
//! The custody API is inconsistent about key-share shape (sometimes a single
//! object, sometimes an array). [`OneOrMany`] absorbs that at the boundary so
//! everything downstream only ever sees the canonical single share.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::WalletRecord;

/// A threshold-signature key share as returned by the custody service.
///
/// The `pubkey` payload is opaque to us (a nested byte-map structure owned by
/// the custody provider); it is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyShare {
    #[serde(default)]
    pub pubkey: serde_json::Value,
    pub secret_share: String,
}

/// Accepts the custody service's single-object or array representation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// Decrypted delegation materials stored after a verified
/// `wallet.delegation.created` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DelegatedMaterial {
    /// Decrypted delegated key share.
    pub key_share: String,
    /// Decrypted per-wallet API key used when acting under delegation.
    pub wallet_api_key: String,
    /// Public key the custody service reported for the delegation.
    pub public_key: String,
    /// Chain the delegation was granted for.
    pub chain: String,
}

/// The signing strategy currently on file for a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SigningMaterial {
    ExternalKeyShares { shares: Vec<KeyShare> },
    Delegated(DelegatedMaterial),
    Unresolved,
}

/// Signing configuration handed to the dispatcher.
///
/// Always carries the canonical single-share shape regardless of how the
/// custody service delivered the shares.
#[derive(Debug, Clone, PartialEq)]
pub enum SigningConfig {
    /// Sign via custody-held server key share, passed per request.
    ServerKeyShare { share: KeyShare },
    /// Sign via locally-held delegated materials.
    Delegated {
        wallet_id: String,
        wallet_api_key: String,
        key_share: String,
    },
}

/// Errors from signing-material resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no signing material on file for wallet {wallet_id}")]
    NoSigningMaterial { wallet_id: String },
}

/// Resolve the signing configuration for a wallet record.
///
/// Pure lookup and shape normalization — no network calls, cheap to retry
/// after a delegation event lands.
pub fn resolve(record: &WalletRecord) -> Result<SigningConfig, ResolveError> {
    match &record.signing_material {
        SigningMaterial::Delegated(material) => Ok(SigningConfig::Delegated {
            wallet_id: record.wallet_id.clone(),
            wallet_api_key: material.wallet_api_key.clone(),
            key_share: material.key_share.clone(),
        }),
        SigningMaterial::ExternalKeyShares { shares } => {
            let share = shares
                .first()
                .cloned()
                .ok_or_else(|| ResolveError::NoSigningMaterial {
                    wallet_id: record.wallet_id.clone(),
                })?;
            Ok(SigningConfig::ServerKeyShare { share })
        }
        SigningMaterial::Unresolved => Err(ResolveError::NoSigningMaterial {
            wallet_id: record.wallet_id.clone(),
        }),
    }
}
