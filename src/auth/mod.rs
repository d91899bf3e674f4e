// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! # Authentication Module
//!
//! JWT authentication for the Paylane API.
//!
//! ## Auth Flow
//!
//! 1. The frontend authenticates the user with the identity provider
//! 2. The frontend sends `Authorization: Bearer <JWT>`
//! 3. This server verifies the RS256 signature against the configured
//!    public key, checks expiry and (when configured) issuer, and extracts
//!    `sub` → canonical `user_id` and `email` → custody identity
//!
//! ## Security
//!
//! - All wallet and transaction endpoints require authentication
//! - Clock skew tolerance is 60 seconds
//! - Signature-less decoding exists only behind the `dev` feature

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::Auth;
