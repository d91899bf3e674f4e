// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Authenticated user identity extracted from a verified JWT.

use serde::Serialize;

/// The identity a handler sees after JWT verification.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    /// Canonical user id (`sub` claim).
    pub user_id: String,
    /// Email identity used for custody wallet lookup (`email` claim).
    pub email: String,
    /// Issuer the token was verified against.
    #[serde(skip)]
    pub issuer: String,
    /// Expiry timestamp of the presented token.
    #[serde(skip)]
    pub expires_at: i64,
}
