// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Delegation webhook event model.

use serde::Deserialize;

/// Common envelope shared by all custody webhook deliveries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationEvent {
    pub event_name: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub webhook_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub environment_id: Option<String>,
    #[serde(default)]
    pub environment_name: Option<String>,
    /// Event-specific payload, parsed further per event kind.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl DelegationEvent {
    /// Wallet id carried in the payload, when present.
    pub fn wallet_id(&self) -> Option<&str> {
        self.data.get("walletId").and_then(|v| v.as_str())
    }

    /// Key used to serialize concurrent processing for one wallet.
    ///
    /// Prefers the wallet id; falls back to the user id so events that omit
    /// the wallet still serialize against other events for that user.
    pub fn lock_key(&self) -> Option<String> {
        self.wallet_id()
            .map(str::to_string)
            .or_else(|| self.user_id.clone())
    }
}

/// The delegation event types this service handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    DelegationCreated,
    DelegationRevoked,
    Signature,
    Ping,
}

impl EventKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "wallet.delegation.created" => Some(Self::DelegationCreated),
            "wallet.delegation.revoked" => Some(Self::DelegationRevoked),
            "wallet.delegation.signature" => Some(Self::Signature),
            "ping" => Some(Self::Ping),
            _ => None,
        }
    }
}

/// Payload of a `wallet.delegation.created` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationCreatedData {
    pub wallet_id: String,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub chain: Option<String>,
    /// Encrypted delegated key share envelope.
    pub key_share: serde_json::Value,
    /// Encrypted per-wallet API key envelope.
    pub wallet_api_key: serde_json::Value,
}

/// Payload of a `wallet.delegation.revoked` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationRevokedData {
    pub wallet_id: String,
}

/// Payload of a `wallet.signature` notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureData {
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub operation: Option<SignatureOperation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureOperation {
    #[serde(default)]
    pub sender: Option<String>,
}
