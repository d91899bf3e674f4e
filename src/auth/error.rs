// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token issuer is invalid
    InvalidIssuer,
    /// Token is missing a required claim
    MissingClaim(&'static str),
    /// No verification key configured
    MissingKey,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::MissingClaim(_) => "missing_claim",
            AuthError::MissingKey => "missing_key",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::MissingClaim(_)
            | AuthError::InvalidIssuer => StatusCode::UNAUTHORIZED,
            AuthError::MissingKey | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            AuthError::MissingAuthHeader => "missing authorization header".to_string(),
            AuthError::InvalidAuthHeader => "invalid authorization header".to_string(),
            AuthError::MalformedToken => "malformed token".to_string(),
            AuthError::InvalidSignature => "invalid token signature".to_string(),
            AuthError::TokenExpired => "token has expired".to_string(),
            AuthError::InvalidIssuer => "invalid token issuer".to_string(),
            AuthError::MissingClaim(claim) => format!("token is missing the {claim} claim"),
            AuthError::MissingKey => "token verification key is not configured".to_string(),
            AuthError::InternalError(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), "authentication failed");
        }
        let body = Json(AuthErrorBody {
            error: self.message(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
