// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! JWKS exposure for downstream token verification.
//!
//! The custody provider verifies the JWTs we mint for it against this
//! endpoint, so the configured RSA public key is published in standard
//! JWK Set form.

use axum::{extract::State, Json};
use base64ct::{Base64UrlUnpadded, Encoding};
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

/// Key id advertised for the service RSA key.
pub const KEY_ID: &str = "paylane-rsa-key";

#[derive(Debug, Serialize, ToSchema)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Jwk {
    pub kty: &'static str,
    pub n: String,
    pub e: String,
    pub alg: &'static str,
    #[serde(rename = "use")]
    pub key_use: &'static str,
    pub kid: &'static str,
}

/// Build the JWK Set from a PEM-encoded RSA public key.
pub fn jwk_set_from_pem(pem: &str) -> Result<JwkSet, ApiError> {
    let key = RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| ApiError::internal("configuration_error", format!("invalid RSA key: {e}")))?;

    Ok(JwkSet {
        keys: vec![Jwk {
            kty: "RSA",
            n: Base64UrlUnpadded::encode_string(&key.n().to_bytes_be()),
            e: Base64UrlUnpadded::encode_string(&key.e().to_bytes_be()),
            alg: "RS256",
            key_use: "sig",
            kid: KEY_ID,
        }],
    })
}

#[utoipa::path(
    get,
    path = "/.well-known/jwks.json",
    tag = "Auth",
    responses(
        (status = 200, body = JwkSet),
        (status = 500, description = "No RSA key configured")
    )
)]
pub async fn jwks(State(state): State<AppState>) -> Result<Json<JwkSet>, ApiError> {
    let pem = state
        .config
        .auth_jwt_public_key_pem
        .as_deref()
        .ok_or_else(|| {
            ApiError::internal("configuration_error", "no RSA public key configured")
        })?;
    Ok(Json(jwk_set_from_pem(pem)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::RsaPrivateKey;

    #[test]
    fn exports_rsa_key_as_jwk() {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let pem = RsaPublicKey::from(&private)
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();

        let set = jwk_set_from_pem(&pem).unwrap();
        assert_eq!(set.keys.len(), 1);
        let jwk = &set.keys[0];
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.kid, KEY_ID);
        assert!(!jwk.n.is_empty());
        assert!(!jwk.n.contains('='));
        assert_eq!(jwk.e, "AQAB");
    }

    #[test]
    fn rejects_garbage_pem() {
        assert!(jwk_set_from_pem("not a key").is_err());
    }
}
