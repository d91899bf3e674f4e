// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! HTTP client for the custody provider's management API.
//!
//! Two calls matter here: authenticating this service into a custody session
//! (needed before submitting sponsored transactions) and the idempotent
//! wallet lookup-or-create used at sign-in.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::signing::{KeyShare, OneOrMany};

#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    #[error("invalid custody API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("custody request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("custody API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("custody response missing expected field: {0}")]
    MalformedResponse(&'static str),
}

/// Short-lived session established via the custody SDK authenticate call.
#[derive(Debug, Clone)]
pub struct CustodySession {
    pub jwt: String,
}

/// A wallet as returned by the custody wallet-creation endpoint.
#[derive(Debug, Clone)]
pub struct CustodyWallet {
    pub wallet_id: String,
    pub account_address: String,
    pub public_key_hex: String,
    pub chain: String,
    pub external_key_shares: Vec<KeyShare>,
    /// True when this call created the wallet rather than returning an
    /// existing one.
    pub is_new: bool,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResponse {
    jwt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWalletResponse {
    user: CreateWalletUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWalletUser {
    wallets: Vec<WalletPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletPayload {
    id: String,
    #[serde(default)]
    account_address: Option<String>,
    #[serde(default)]
    address: Option<String>,
    public_key: String,
    #[serde(default = "default_chain")]
    chain: String,
    #[serde(default)]
    external_server_key_shares: Option<OneOrMany<KeyShare>>,
}

fn default_chain() -> String {
    "EVM".to_string()
}

#[derive(Clone, Debug)]
pub struct CustodyClient {
    api_base: Url,
    environment_id: String,
    auth_token: String,
    http: reqwest::Client,
}

impl CustodyClient {
    pub fn new(
        api_base: &str,
        environment_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, CustodyError> {
        Ok(Self {
            api_base: Url::parse(api_base)?,
            environment_id: environment_id.into(),
            auth_token: auth_token.into(),
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, suffix: &str) -> Result<Url, CustodyError> {
        Ok(self.api_base.join(&format!(
            "environments/{}/{suffix}",
            self.environment_id
        ))?)
    }

    /// Exchange the service auth token for a custody session JWT.
    pub async fn authenticate(&self) -> Result<CustodySession, CustodyError> {
        let url = self.endpoint("sdk/authenticate")?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "token": self.auth_token }))
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: AuthenticateResponse = response.json().await?;
        Ok(CustodySession { jwt: body.jwt })
    }

    /// Look up or create the custody wallet for an email identity.
    ///
    /// The custody endpoint is itself idempotent per identifier; a repeated
    /// call returns the existing wallet with a 200 rather than 201.
    pub async fn get_or_create_wallet(&self, email: &str) -> Result<CustodyWallet, CustodyError> {
        let url = self.endpoint("waas/create")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.auth_token)
            .json(&json!({
                "identifier": email,
                "type": "email",
                "chains": ["EVM"],
                "environmentId": self.environment_id,
            }))
            .send()
            .await?;
        let is_new = response.status() == StatusCode::CREATED;
        let response = check_status(response).await?;
        let body: CreateWalletResponse = response.json().await?;

        let wallet = body
            .user
            .wallets
            .into_iter()
            .next()
            .ok_or(CustodyError::MalformedResponse("user.wallets"))?;
        let account_address = wallet
            .account_address
            .or(wallet.address)
            .ok_or(CustodyError::MalformedResponse("wallet address"))?;

        Ok(CustodyWallet {
            wallet_id: wallet.id,
            account_address,
            public_key_hex: wallet.public_key,
            chain: wallet.chain,
            external_key_shares: wallet
                .external_server_key_shares
                .map(OneOrMany::into_vec)
                .unwrap_or_default(),
            is_new,
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CustodyError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(CustodyError::Api { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_under_environment() {
        let client = CustodyClient::new("https://custody.example.com/api/v0/", "env-1", "tok")
            .unwrap();
        let url = client.endpoint("waas/create").unwrap();
        assert_eq!(
            url.as_str(),
            "https://custody.example.com/api/v0/environments/env-1/waas/create"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            CustodyClient::new("not a url", "env", "tok").unwrap_err(),
            CustodyError::Url(_)
        ));
    }

    #[test]
    fn wallet_payload_accepts_single_or_many_shares() {
        let single: WalletPayload = serde_json::from_str(
            r#"{
                "id": "w-1",
                "accountAddress": "0xabc",
                "publicKey": "0x04aa",
                "externalServerKeyShares": {"pubkey":{},"secretShare":"s1"}
            }"#,
        )
        .unwrap();
        assert_eq!(
            single
                .external_server_key_shares
                .map(OneOrMany::into_vec)
                .unwrap()
                .len(),
            1
        );

        let many: WalletPayload = serde_json::from_str(
            r#"{
                "id": "w-1",
                "address": "0xabc",
                "publicKey": "0x04aa",
                "externalServerKeyShares": [
                    {"pubkey":{},"secretShare":"s1"},
                    {"pubkey":{},"secretShare":"s2"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            many.external_server_key_shares
                .map(OneOrMany::into_vec)
                .unwrap()
                .len(),
            2
        );
    }
}
