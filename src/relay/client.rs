// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! HTTP client for the custody relay endpoint.
//!
//! The relay accepts a fully-described transaction plus signing configuration
//! and handles account-abstraction details (bundling, paymaster sponsorship)
//! on its side. This client only shapes the request and interprets failures
//! textually, since the relay reports sponsorship and balance problems as
//! plain error strings.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::signing::SigningConfig;

use super::types::{SponsoredTxResult, ValidatedTx};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid relay URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("relay returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("relay response missing transaction hash")]
    MissingHash,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RelayClient {
    api_base: Url,
    environment_id: String,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(api_base: &str, environment_id: impl Into<String>) -> Result<Self, RelayError> {
        Ok(Self {
            api_base: Url::parse(api_base)?,
            environment_id: environment_id.into(),
            http: reqwest::Client::new(),
        })
    }

    /// Submit a sponsored transaction through the relay.
    pub async fn submit(
        &self,
        session_jwt: &str,
        network_id: u64,
        tx: &ValidatedTx,
        signing: &SigningConfig,
    ) -> Result<SponsoredTxResult, RelayError> {
        let url = self.api_base.join(&format!(
            "environments/{}/waas/relay",
            self.environment_id
        ))?;

        let mut body = json!({
            "networkId": network_id,
            "walletId": tx.wallet_id,
            "withSponsorship": true,
            "transaction": {
                "from": tx.from_address.to_string(),
                "to": tx.to.to_string(),
                "value": tx.value.to_string(),
                "data": tx.call_data.as_ref().map(|d| format!("0x{}", hex::encode(d))),
            },
        });
        match signing {
            SigningConfig::ServerKeyShare { share } => {
                body["externalServerKeyShares"] = json!([share]);
            }
            SigningConfig::Delegated {
                wallet_api_key,
                key_share,
                ..
            } => {
                body["walletApiKey"] = json!(wallet_api_key);
                body["keyShare"] = json!(key_share);
            }
        }

        let response = self
            .http
            .post(url)
            .bearer_auth(session_jwt)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Api { status, body });
        }

        let payload: RelayResponse = response.json().await?;
        let transaction_hash = payload
            .transaction_hash
            .or(payload.hash)
            .ok_or(RelayError::MissingHash)?;
        Ok(SponsoredTxResult {
            transaction_hash,
            success: true,
            message: payload.message,
        })
    }
}
