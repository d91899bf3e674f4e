// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! End-to-end webhook delivery tests against the full router.

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::U256;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use hmac::{Hmac, Mac};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tempfile::TempDir;
use tower::ServiceExt;

use paylane_server::api::router;
use paylane_server::config::Config;
use paylane_server::custody::DelegationDecryptionKey;
use paylane_server::signing::{KeyShare, SigningMaterial};
use paylane_server::state::AppState;
use paylane_server::storage::{Storage, StoragePaths, WalletRecord, WalletRepository};

const WEBHOOK_SECRET: &str = "test-webhook-secret";

struct TestServer {
    _dir: TempDir,
    state: AppState,
    custody_public: RsaPublicKey,
}

fn test_config(data_dir: PathBuf, delegation_key: Option<DelegationDecryptionKey>) -> Config {
    Config {
        data_dir,
        host: "127.0.0.1".to_string(),
        port: 0,
        custody_api_base: "https://custody.invalid/api/v0/".to_string(),
        custody_environment_id: "env-test".to_string(),
        custody_auth_token: "token".to_string(),
        custody_webhook_secret: WEBHOOK_SECRET.to_string(),
        delegation_key,
        auth_jwt_public_key_pem: None,
        auth_jwt_issuer: None,
        chain_rpc_url: "https://sepolia.base.org".to_string(),
        funding_enabled: false,
        funding_amount_wei: U256::ZERO,
        funding_wallet_user_id: None,
        confirmation_timeout: Duration::from_secs(1),
    }
}

fn server() -> TestServer {
    let dir = TempDir::new().unwrap();

    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
    let custody_public = RsaPublicKey::from(&private);

    let config = test_config(
        dir.path().to_path_buf(),
        Some(DelegationDecryptionKey::new(private)),
    );

    let mut storage = Storage::new(StoragePaths::new(dir.path()));
    storage.initialize().unwrap();
    let state = AppState::from_config(config, storage).unwrap();

    TestServer {
        _dir: dir,
        state,
        custody_public,
    }
}

fn seed_wallet(state: &AppState, user_id: &str) {
    WalletRepository::new(&state.storage)
        .upsert(WalletRecord::new(
            user_id,
            "w-1",
            "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12",
            "0x04aa",
            "EVM",
            vec![KeyShare {
                pubkey: serde_json::json!({}),
                secret_share: "s1".into(),
            }],
        ))
        .unwrap();
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn webhook_request(body: &str, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/custody/delegation")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-custody-signature-256", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn created_event_body(public: &RsaPublicKey, user_id: &str) -> String {
    // Helpers from the crate are not exposed for envelope encryption, so the
    // custody side is replicated here.
    use aes_gcm::aead::Aead;
    use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
    use base64ct::{Base64, Encoding};
    use rsa::Oaep;

    let mut rng = rand::thread_rng();
    let mut encrypt = |plaintext: &str| {
        let aes_key: [u8; 32] = rand::Rng::gen(&mut rand::thread_rng());
        let iv: [u8; 12] = rand::Rng::gen(&mut rand::thread_rng());
        let cipher = Aes256Gcm::new_from_slice(&aes_key).unwrap();
        let sealed = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .unwrap();
        let (ct, tag) = sealed.split_at(sealed.len() - 16);
        let ek = public
            .encrypt(&mut rng, Oaep::new::<Sha256>(), &aes_key)
            .unwrap();
        serde_json::json!({
            "ct": Base64::encode_string(ct),
            "ek": Base64::encode_string(&ek),
            "iv": Base64::encode_string(&iv),
            "tag": Base64::encode_string(tag),
        })
    };

    serde_json::json!({
        "eventName": "wallet.delegation.created",
        "userId": user_id,
        "messageId": "msg-1",
        "data": {
            "walletId": "w-1",
            "publicKey": "0x04ff",
            "chain": "EVM",
            "keyShare": encrypt("delegated-share"),
            "walletApiKey": encrypt("wallet-api-key"),
        }
    })
    .to_string()
}

#[tokio::test]
async fn invalid_signature_is_rejected_and_store_untouched() {
    let server = server();
    seed_wallet(&server.state, "u-1");

    let body = created_event_body(&server.custody_public, "u-1");
    let response = router(server.state.clone())
        .oneshot(webhook_request(&body, Some("sha256=deadbeef".to_string())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let record = WalletRepository::new(&server.state.storage)
        .get("u-1")
        .unwrap();
    assert!(matches!(
        record.signing_material,
        SigningMaterial::ExternalKeyShares { .. }
    ));
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let server = server();
    let response = router(server.state.clone())
        .oneshot(webhook_request(r#"{"eventName":"ping","data":{}}"#, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_event_installs_delegation() {
    let server = server();
    seed_wallet(&server.state, "u-1");

    let body = created_event_body(&server.custody_public, "u-1");
    let signature = sign(body.as_bytes());
    let response = router(server.state.clone())
        .oneshot(webhook_request(&body, Some(signature)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = WalletRepository::new(&server.state.storage)
        .get("u-1")
        .unwrap();
    match record.signing_material {
        SigningMaterial::Delegated(material) => {
            assert_eq!(material.key_share, "delegated-share");
            assert_eq!(material.wallet_api_key, "wallet-api-key");
        }
        other => panic!("unexpected material: {other:?}"),
    }
}

#[tokio::test]
async fn revoke_after_create_falls_back_to_shares() {
    let server = server();
    seed_wallet(&server.state, "u-1");

    let app = router(server.state.clone());

    let created = created_event_body(&server.custody_public, "u-1");
    let signature = sign(created.as_bytes());
    let response = app
        .clone()
        .oneshot(webhook_request(&created, Some(signature)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let revoke = serde_json::json!({
        "eventName": "wallet.delegation.revoked",
        "userId": "u-1",
        "data": { "walletId": "w-1" }
    })
    .to_string();
    let signature = sign(revoke.as_bytes());
    let response = app
        .oneshot(webhook_request(&revoke, Some(signature)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = WalletRepository::new(&server.state.storage)
        .get("u-1")
        .unwrap();
    assert!(matches!(
        record.signing_material,
        SigningMaterial::ExternalKeyShares { .. }
    ));
}

#[tokio::test]
async fn ping_is_acknowledged() {
    let server = server();
    let body = r#"{"eventName":"ping","data":{}}"#;
    let signature = sign(body.as_bytes());
    let response = router(server.state.clone())
        .oneshot(webhook_request(body, Some(signature)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let ack: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(ack["status"], "success");
    assert_eq!(ack["message"], "pong");
}

#[tokio::test]
async fn unknown_event_type_is_bad_request() {
    let server = server();
    let body = r#"{"eventName":"wallet.exported","data":{}}"#;
    let signature = sign(body.as_bytes());
    let response = router(server.state.clone())
        .oneshot(webhook_request(body, Some(signature)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_jwks_do_not_require_auth() {
    let server = server();
    let app = router(server.state.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No RSA key configured, so JWKS reports a server-side config error.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/.well-known/jwks.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
