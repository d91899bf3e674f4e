// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Paylane - Embedded Wallet Issuance and Sponsored Transaction Service
//!
//! This crate provides per-user blockchain wallets issued at sign-up through
//! an external custody provider, with gas-sponsored transaction submission so
//! users never hold native currency for fees.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - JWT authentication
//! - `custody` - Custody provider client, delegation webhooks, envelope decryption
//! - `relay` - Sponsored transaction dispatch and chain RPC
//! - `funding` - Initial funding of new wallets
//! - `storage` - JSON-file wallet records and funding ledger

pub mod api;
pub mod auth;
pub mod config;
pub mod custody;
pub mod error;
pub mod funding;
pub mod models;
pub mod relay;
pub mod signing;
pub mod state;
pub mod storage;
