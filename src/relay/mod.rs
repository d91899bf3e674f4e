// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Sponsored transaction relay: request validation, custody relay client,
//! chain RPC reads, and the dispatch pipeline tying them together.

pub mod chain;
pub mod client;
pub mod dispatcher;
pub mod types;

pub use chain::{ChainClient, ChainError};
pub use client::{RelayClient, RelayError};
pub use dispatcher::{classify_relay_error, validate, DispatchError, Dispatcher, SponsoredDispatch};
pub use types::{
    ConfirmationPolicy, NetworkConfig, SponsoredTxRequest, SponsoredTxResult, ValidatedTx,
    BASE_SEPOLIA,
};
