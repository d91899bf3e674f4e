// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! API request/response models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Wallet lookup/creation response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    /// On-chain account address.
    pub address: String,
    /// Custody-service wallet id.
    pub wallet_id: String,
    /// True when this request created the wallet.
    pub is_new: bool,
}

/// Native balance response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub address: String,
    /// Balance in wei, as a decimal string.
    pub balance_wei: String,
    pub network: String,
}

/// Sponsored transaction submission request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionRequest {
    /// Destination address, 0x-prefixed.
    pub to: String,
    /// Amount in wei, as a decimal string.
    pub value: String,
    /// Sender address; must match the caller's wallet on file.
    pub wallet_address: String,
    /// Optional 0x-prefixed call data.
    #[serde(default)]
    pub data: Option<String>,
}

/// Sponsored transaction submission response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub success: bool,
    pub transaction_hash: String,
}

/// Acknowledgement returned to the custody webhook sender.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
}

impl WebhookAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            user_id: None,
            wallet_id: None,
        }
    }
}
