// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Minimal JWT claims for the identity provider's tokens.
#[derive(Debug, Deserialize)]
struct JwtClaims {
    /// Subject (user ID)
    sub: String,
    /// Email identity
    #[serde(default)]
    email: Option<String>,
    /// Expiration timestamp
    #[serde(default)]
    exp: i64,
    /// Issuer
    #[serde(default)]
    iss: String,
}

/// Extractor for authenticated users.
///
/// ## Authentication Modes
///
/// - **Production mode** (`AUTH_JWT_PUBLIC_KEY` set): full RS256 signature
///   verification with issuer and expiry checks.
/// - **Development mode** (`dev` feature, no key configured): structure
///   validation only, no signature check.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Middleware or tests may already have set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = verify_jwt(
            token,
            state.config.auth_jwt_public_key_pem.as_deref(),
            state.config.auth_jwt_issuer.as_deref(),
        )?;

        Ok(Auth(user))
    }
}

fn verify_jwt(
    token: &str,
    public_key_pem: Option<&str>,
    issuer: Option<&str>,
) -> Result<AuthenticatedUser, AuthError> {
    match public_key_pem {
        Some(pem) => verify_jwt_production(token, pem, issuer),
        None => verify_jwt_development(token),
    }
}

/// Production JWT verification against the configured RSA public key.
fn verify_jwt_production(
    token: &str,
    public_key_pem: &str,
    issuer: Option<&str>,
) -> Result<AuthenticatedUser, AuthError> {
    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| AuthError::InternalError(format!("invalid verification key: {e}")))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.validate_aud = false;
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }

    let token_data =
        decode::<JwtClaims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            _ => AuthError::MalformedToken,
        })?;

    to_user(token_data.claims)
}

/// Development JWT verification (no signature check).
///
/// WARNING: only compiled with the `dev` feature.
#[cfg(feature = "dev")]
fn verify_jwt_development(token: &str) -> Result<AuthenticatedUser, AuthError> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<JwtClaims>(token)
        .map_err(|_| AuthError::MalformedToken)?;
    let claims = token_data.claims;

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| AuthError::InternalError(e.to_string()))?
        .as_secs() as i64;
    if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }

    to_user(claims)
}

#[cfg(not(feature = "dev"))]
fn verify_jwt_development(_token: &str) -> Result<AuthenticatedUser, AuthError> {
    Err(AuthError::MissingKey)
}

fn to_user(claims: JwtClaims) -> Result<AuthenticatedUser, AuthError> {
    let email = claims
        .email
        .filter(|e| !e.is_empty())
        .ok_or(AuthError::MissingClaim("email"))?;
    Ok(AuthenticatedUser {
        user_id: claims.sub,
        email,
        issuer: claims.iss,
        expires_at: claims.exp,
    })
}
