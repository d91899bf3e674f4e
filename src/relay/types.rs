// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Relay request/result types and network configuration.

use alloy::primitives::{Address, U256};

/// Static parameters of the chain this service operates on.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: &'static str,
    pub default_rpc_url: &'static str,
}

/// Base Sepolia, the only network currently supported.
pub const BASE_SEPOLIA: NetworkConfig = NetworkConfig {
    chain_id: 84532,
    name: "base-sepolia",
    default_rpc_url: "https://sepolia.base.org",
};

/// Whether a dispatch waits for on-chain inclusion or returns on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPolicy {
    /// Block until the transaction is included and a receipt is available.
    WaitForInclusion,
    /// Return as soon as the relay accepts the transaction.
    SubmitOnly,
}

/// A sponsored transaction as requested by a caller, before validation.
#[derive(Debug, Clone)]
pub struct SponsoredTxRequest {
    /// Sender wallet id at the custody service.
    pub wallet_id: String,
    /// Sender account address.
    pub from_address: String,
    /// Destination address, 0x-prefixed.
    pub to: String,
    /// Amount in wei as a decimal string.
    pub value_wei: String,
    /// Optional 0x-prefixed call data.
    pub call_data: Option<String>,
}

/// The same request after validation, with parsed on-chain types.
#[derive(Debug, Clone)]
pub struct ValidatedTx {
    pub wallet_id: String,
    pub from_address: Address,
    pub to: Address,
    pub value: U256,
    pub call_data: Option<Vec<u8>>,
}

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct SponsoredTxResult {
    pub transaction_hash: String,
    /// False when the transaction was included but reverted.
    pub success: bool,
    pub message: Option<String>,
}
