// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for wallet and ledger storage | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `CUSTODY_API_BASE` | Custody provider API base URL | `https://app.dynamicauth.com/api/v0/` |
//! | `CUSTODY_ENVIRONMENT_ID` | Custody environment id | Required |
//! | `CUSTODY_AUTH_TOKEN` | Custody service auth token | Required |
//! | `CUSTODY_WEBHOOK_SECRET` | HMAC secret for webhook signatures | Required |
//! | `DELEGATION_PRIVATE_KEY` | RSA private key (PEM or base64 PEM) for delegation envelopes | Optional |
//! | `AUTH_JWT_PUBLIC_KEY` | RSA public key (PEM or base64 PEM) for user JWT verification | Required outside `dev` |
//! | `AUTH_JWT_ISSUER` | Expected JWT issuer claim | Optional |
//! | `CHAIN_RPC_URL` | Chain JSON-RPC endpoint | `https://sepolia.base.org` |
//! | `ENABLE_AUTO_FUNDING` | Fund newly created wallets (`true`/`false`) | `false` |
//! | `FUNDING_AMOUNT_WEI` | Amount transferred per new wallet, in wei | `1000000000000000` |
//! | `FUNDING_WALLET_USER_ID` | User id of the funding-source wallet record | Required when funding enabled |
//! | `RELAY_CONFIRMATION_TIMEOUT_SECS` | Max wait for on-chain inclusion | `60` |

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::U256;
use base64ct::{Base64, Encoding};
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;

use crate::custody::DelegationDecryptionKey;

pub const DEFAULT_CUSTODY_API_BASE: &str = "https://app.dynamicauth.com/api/v0/";
pub const DEFAULT_FUNDING_AMOUNT_WEI: &str = "1000000000000000";
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Fully-resolved runtime configuration.
pub struct Config {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,

    pub custody_api_base: String,
    pub custody_environment_id: String,
    pub custody_auth_token: String,
    pub custody_webhook_secret: String,
    /// Absent when delegation envelopes cannot be decrypted; delegation
    /// created events then fail hard.
    pub delegation_key: Option<DelegationDecryptionKey>,

    /// PEM-encoded RSA public key for verifying user JWTs. Absent only in
    /// `dev` builds, where signature verification is skipped.
    pub auth_jwt_public_key_pem: Option<String>,
    pub auth_jwt_issuer: Option<String>,

    pub chain_rpc_url: String,

    pub funding_enabled: bool,
    pub funding_amount_wei: U256,
    pub funding_wallet_user_id: Option<String>,

    pub confirmation_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(env_or_default("DATA_DIR", "/data"));
        let host = env_or_default("HOST", "0.0.0.0");
        let port = env_or_default("PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue {
                name: "PORT".into(),
                reason: e.to_string(),
            })?;

        let custody_api_base = env_or_default("CUSTODY_API_BASE", DEFAULT_CUSTODY_API_BASE);
        let custody_environment_id = env_required("CUSTODY_ENVIRONMENT_ID")?;
        let custody_auth_token = env_required("CUSTODY_AUTH_TOKEN")?;
        let custody_webhook_secret = env_required("CUSTODY_WEBHOOK_SECRET")?;

        let delegation_key = match env_optional("DELEGATION_PRIVATE_KEY") {
            Some(raw) => Some(parse_delegation_key(&raw)?),
            None => None,
        };

        let auth_jwt_public_key_pem = match env_optional("AUTH_JWT_PUBLIC_KEY") {
            Some(raw) => Some(decode_pem_material("AUTH_JWT_PUBLIC_KEY", &raw)?),
            None => None,
        };
        if auth_jwt_public_key_pem.is_none() && !cfg!(feature = "dev") {
            return Err(ConfigError::MissingVar("AUTH_JWT_PUBLIC_KEY".into()));
        }
        let auth_jwt_issuer = env_optional("AUTH_JWT_ISSUER");

        let chain_rpc_url = env_or_default(
            "CHAIN_RPC_URL",
            crate::relay::BASE_SEPOLIA.default_rpc_url,
        );

        let funding_enabled = env_or_default("ENABLE_AUTO_FUNDING", "false")
            .eq_ignore_ascii_case("true");
        let funding_amount_wei = U256::from_str_radix(
            &env_or_default("FUNDING_AMOUNT_WEI", DEFAULT_FUNDING_AMOUNT_WEI),
            10,
        )
        .map_err(|e| ConfigError::InvalidValue {
            name: "FUNDING_AMOUNT_WEI".into(),
            reason: e.to_string(),
        })?;
        let funding_wallet_user_id = env_optional("FUNDING_WALLET_USER_ID");
        if funding_enabled && funding_wallet_user_id.is_none() {
            return Err(ConfigError::MissingVar("FUNDING_WALLET_USER_ID".into()));
        }

        let confirmation_timeout = Duration::from_secs(
            env_or_default(
                "RELAY_CONFIRMATION_TIMEOUT_SECS",
                &DEFAULT_CONFIRMATION_TIMEOUT_SECS.to_string(),
            )
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue {
                name: "RELAY_CONFIRMATION_TIMEOUT_SECS".into(),
                reason: e.to_string(),
            })?,
        );

        Ok(Self {
            data_dir,
            host,
            port,
            custody_api_base,
            custody_environment_id,
            custody_auth_token,
            custody_webhook_secret,
            delegation_key,
            auth_jwt_public_key_pem,
            auth_jwt_issuer,
            chain_rpc_url,
            funding_enabled,
            funding_amount_wei,
            funding_wallet_user_id,
            confirmation_timeout,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_delegation_key(raw: &str) -> Result<DelegationDecryptionKey, ConfigError> {
    let pem = decode_pem_material("DELEGATION_PRIVATE_KEY", raw)?;
    let key = RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|e| ConfigError::InvalidValue {
        name: "DELEGATION_PRIVATE_KEY".into(),
        reason: e.to_string(),
    })?;
    Ok(DelegationDecryptionKey::new(key))
}

/// Accept key material either as literal PEM (possibly with `\n` escapes,
/// as injected by some secret managers) or as base64-wrapped PEM.
fn decode_pem_material(name: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("-----BEGIN") {
        return Ok(trimmed.replace("\\n", "\n"));
    }
    let decoded = Base64::decode_vec(trimmed).map_err(|e| ConfigError::InvalidValue {
        name: name.into(),
        reason: format!("neither PEM nor base64 PEM: {e}"),
    })?;
    let pem = String::from_utf8(decoded).map_err(|_| ConfigError::InvalidValue {
        name: name.into(),
        reason: "decoded key material is not UTF-8".into(),
    })?;
    Ok(pem.trim().to_string())
}

fn env_required(name: &str) -> Result<String, ConfigError> {
    env_optional(name).ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_material_passes_through() {
        let pem = "-----BEGIN PUBLIC KEY-----\nabc\n-----END PUBLIC KEY-----";
        assert_eq!(decode_pem_material("X", pem).unwrap(), pem);
    }

    #[test]
    fn escaped_newlines_are_unescaped() {
        let raw = "-----BEGIN PUBLIC KEY-----\\nabc\\n-----END PUBLIC KEY-----";
        let pem = decode_pem_material("X", raw).unwrap();
        assert!(pem.contains("\nabc\n"));
    }

    #[test]
    fn base64_wrapped_pem_is_decoded() {
        let pem = "-----BEGIN PUBLIC KEY-----\nabc\n-----END PUBLIC KEY-----";
        let wrapped = Base64::encode_string(pem.as_bytes());
        assert_eq!(decode_pem_material("X", &wrapped).unwrap(), pem);
    }

    #[test]
    fn garbage_key_material_is_rejected() {
        assert!(decode_pem_material("X", "!!!definitely not a key!!!").is_err());
    }
}
