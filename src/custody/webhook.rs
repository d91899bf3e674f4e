// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Webhook signature verification and event processing.
//!
//! Signatures are HMAC-SHA256 over the raw request body bytes, delivered as
//! `sha256=<hex>` in the signature header. Verification happens before the
//! body is parsed, so a forged payload never reaches JSON handling, and the
//! comparison is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::custody::envelope::{DelegationDecryptionKey, EncryptedEnvelope, EnvelopeError};
use crate::custody::events::{
    DelegationCreatedData, DelegationEvent, DelegationRevokedData, EventKind, SignatureData,
};
use crate::signing::DelegatedMaterial;
use crate::storage::{Storage, StorageError, WalletRepository};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-custody-signature-256";
const SIGNATURE_PREFIX: &str = "sha256=";

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook secret is not configured")]
    MissingSecret,

    #[error("missing webhook signature header")]
    MissingSignature,

    #[error("webhook signature mismatch")]
    SignatureInvalid,

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("malformed event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("delegation decryption key is not configured")]
    MissingDecryptionKey,

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("no wallet on file for user {0}")]
    WalletNotFound(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for WebhookError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => WebhookError::WalletNotFound(what),
            other => WebhookError::Storage(other),
        }
    }
}

/// Verify the signature header against the raw body bytes.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), WebhookError> {
    if secret.is_empty() {
        return Err(WebhookError::MissingSecret);
    }
    let header = header.ok_or(WebhookError::MissingSignature)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::MissingSecret)?;
    mac.update(body);
    let expected = format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()));

    if expected.as_bytes().ct_eq(header.as_bytes()).into() {
        Ok(())
    } else {
        Err(WebhookError::SignatureInvalid)
    }
}

/// Outcome of processing one event, echoed back in the acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    DelegationStored { user_id: String, wallet_id: String },
    DelegationCleared { user_id: String, wallet_id: String },
    SignatureLogged,
    Pong,
}

/// Applies verified delegation events to the credential store.
pub struct WebhookProcessor<'a> {
    storage: &'a Storage,
    decryption_key: Option<&'a DelegationDecryptionKey>,
}

impl<'a> WebhookProcessor<'a> {
    pub fn new(storage: &'a Storage, decryption_key: Option<&'a DelegationDecryptionKey>) -> Self {
        Self {
            storage,
            decryption_key,
        }
    }

    /// Dispatch a verified event by kind.
    pub fn process(&self, event: &DelegationEvent) -> Result<ProcessOutcome, WebhookError> {
        let kind = EventKind::parse(&event.event_name)
            .ok_or_else(|| WebhookError::UnknownEventType(event.event_name.clone()))?;
        match kind {
            EventKind::DelegationCreated => self.handle_created(event),
            EventKind::DelegationRevoked => self.handle_revoked(event),
            EventKind::Signature => self.handle_signature(event),
            EventKind::Ping => {
                tracing::info!(
                    message_id = event.message_id.as_deref(),
                    "webhook ping received"
                );
                Ok(ProcessOutcome::Pong)
            }
        }
    }

    fn handle_created(&self, event: &DelegationEvent) -> Result<ProcessOutcome, WebhookError> {
        let user_id = event
            .user_id
            .clone()
            .ok_or_else(|| WebhookError::WalletNotFound("<missing userId>".into()))?;
        let data: DelegationCreatedData = serde_json::from_value(event.data.clone())?;

        let key = self
            .decryption_key
            .ok_or(WebhookError::MissingDecryptionKey)?;

        let key_share = decrypt_envelope(key, &data.key_share)?;
        let wallet_api_key = decrypt_envelope(key, &data.wallet_api_key)?;

        let material = DelegatedMaterial {
            key_share,
            wallet_api_key,
            public_key: data.public_key.unwrap_or_default(),
            chain: data.chain.unwrap_or_else(|| "EVM".to_string()),
        };

        let repo = WalletRepository::new(self.storage);
        repo.set_delegated(&user_id, material)?;

        tracing::info!(user_id = %user_id, wallet_id = %data.wallet_id, "delegation stored");
        Ok(ProcessOutcome::DelegationStored {
            user_id,
            wallet_id: data.wallet_id,
        })
    }

    fn handle_revoked(&self, event: &DelegationEvent) -> Result<ProcessOutcome, WebhookError> {
        let data: DelegationRevokedData = serde_json::from_value(event.data.clone())?;
        let user_id = event.user_id.clone().unwrap_or_default();

        let repo = WalletRepository::new(self.storage);
        match repo.clear_delegated(&user_id)? {
            Some(_) => {
                tracing::info!(user_id = %user_id, wallet_id = %data.wallet_id, "delegation cleared")
            }
            None => tracing::info!(
                user_id = %user_id,
                wallet_id = %data.wallet_id,
                "delegation revoke for unknown wallet, ignoring"
            ),
        }
        Ok(ProcessOutcome::DelegationCleared {
            user_id,
            wallet_id: data.wallet_id,
        })
    }

    fn handle_signature(&self, event: &DelegationEvent) -> Result<ProcessOutcome, WebhookError> {
        let data: SignatureData = serde_json::from_value(event.data.clone())?;
        tracing::info!(
            chain_id = data.chain_id,
            sender = data.operation.and_then(|op| op.sender).as_deref(),
            "signature notification received"
        );
        Ok(ProcessOutcome::SignatureLogged)
    }
}

fn decrypt_envelope(
    key: &DelegationDecryptionKey,
    value: &serde_json::Value,
) -> Result<String, WebhookError> {
    let envelope: EncryptedEnvelope = serde_json::from_value(value.clone())?;
    Ok(key.decrypt(&envelope)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::envelope::test_support::encrypt_for;
    use crate::signing::{KeyShare, SigningMaterial};
    use crate::storage::{StoragePaths, WalletRecord};
    use rsa::{RsaPrivateKey, RsaPublicKey};
    use tempfile::TempDir;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (dir, storage)
    }

    fn keypair() -> (DelegationDecryptionKey, RsaPublicKey) {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        (DelegationDecryptionKey::new(private), public)
    }

    fn seed_wallet(storage: &Storage, user_id: &str) {
        let repo = WalletRepository::new(storage);
        repo.upsert(WalletRecord::new(
            user_id,
            "w-1",
            "0xabc",
            "0x04aa",
            "EVM",
            vec![KeyShare {
                pubkey: serde_json::json!({}),
                secret_share: "s1".into(),
            }],
        ))
        .unwrap();
    }

    fn created_event(public: &RsaPublicKey, user_id: &str) -> DelegationEvent {
        let key_share = encrypt_for(public, "delegated-share");
        let api_key = encrypt_for(public, "wallet-api-key");
        serde_json::from_value(serde_json::json!({
            "eventName": "wallet.delegation.created",
            "userId": user_id,
            "data": {
                "walletId": "w-1",
                "publicKey": "0x04ff",
                "chain": "EVM",
                "keyShare": {
                    "ct": key_share.ct, "ek": key_share.ek,
                    "iv": key_share.iv, "tag": key_share.tag
                },
                "walletApiKey": {
                    "ct": api_key.ct, "ek": api_key.ek,
                    "iv": api_key.iv, "tag": api_key.tag
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"eventName":"ping"}"#;
        let header = sign("secret", body);
        assert!(verify_signature("secret", body, Some(&header)).is_ok());
    }

    #[test]
    fn rejects_flipped_bit() {
        let body = br#"{"eventName":"ping"}"#;
        let mut header = sign("secret", body).into_bytes();
        let last = header.len() - 1;
        header[last] = if header[last] == b'0' { b'1' } else { b'0' };
        let header = String::from_utf8(header).unwrap();
        assert!(matches!(
            verify_signature("secret", body, Some(&header)).unwrap_err(),
            WebhookError::SignatureInvalid
        ));
    }

    #[test]
    fn rejects_wrong_secret_and_missing_header() {
        let body = b"{}";
        let header = sign("other-secret", body);
        assert!(matches!(
            verify_signature("secret", body, Some(&header)).unwrap_err(),
            WebhookError::SignatureInvalid
        ));
        assert!(matches!(
            verify_signature("secret", body, None).unwrap_err(),
            WebhookError::MissingSignature
        ));
        assert!(matches!(
            verify_signature("", body, Some(&header)).unwrap_err(),
            WebhookError::MissingSecret
        ));
    }

    #[test]
    fn created_event_installs_delegated_material() {
        let (_dir, storage) = storage();
        let (key, public) = keypair();
        seed_wallet(&storage, "u-1");

        let processor = WebhookProcessor::new(&storage, Some(&key));
        let outcome = processor.process(&created_event(&public, "u-1")).unwrap();
        assert_eq!(
            outcome,
            ProcessOutcome::DelegationStored {
                user_id: "u-1".into(),
                wallet_id: "w-1".into(),
            }
        );

        let record = WalletRepository::new(&storage).get("u-1").unwrap();
        match record.signing_material {
            SigningMaterial::Delegated(material) => {
                assert_eq!(material.key_share, "delegated-share");
                assert_eq!(material.wallet_api_key, "wallet-api-key");
            }
            other => panic!("unexpected material: {other:?}"),
        }
    }

    #[test]
    fn created_event_is_idempotent() {
        let (_dir, storage) = storage();
        let (key, public) = keypair();
        seed_wallet(&storage, "u-1");

        let processor = WebhookProcessor::new(&storage, Some(&key));
        let event = created_event(&public, "u-1");
        processor.process(&event).unwrap();
        processor.process(&event).unwrap();

        let record = WalletRepository::new(&storage).get("u-1").unwrap();
        assert!(matches!(
            record.signing_material,
            SigningMaterial::Delegated(_)
        ));
    }

    #[test]
    fn created_without_decryption_key_fails_hard() {
        let (_dir, storage) = storage();
        let (_, public) = keypair();
        seed_wallet(&storage, "u-1");

        let processor = WebhookProcessor::new(&storage, None);
        assert!(matches!(
            processor.process(&created_event(&public, "u-1")).unwrap_err(),
            WebhookError::MissingDecryptionKey
        ));
    }

    #[test]
    fn revoke_clears_delegation() {
        let (_dir, storage) = storage();
        let (key, public) = keypair();
        seed_wallet(&storage, "u-1");

        let processor = WebhookProcessor::new(&storage, Some(&key));
        processor.process(&created_event(&public, "u-1")).unwrap();

        let revoke: DelegationEvent = serde_json::from_value(serde_json::json!({
            "eventName": "wallet.delegation.revoked",
            "userId": "u-1",
            "data": { "walletId": "w-1" }
        }))
        .unwrap();
        processor.process(&revoke).unwrap();

        let record = WalletRepository::new(&storage).get("u-1").unwrap();
        assert!(matches!(
            record.signing_material,
            SigningMaterial::ExternalKeyShares { .. }
        ));
    }

    #[test]
    fn revoke_before_create_is_acknowledged() {
        let (_dir, storage) = storage();
        let processor = WebhookProcessor::new(&storage, None);

        let revoke: DelegationEvent = serde_json::from_value(serde_json::json!({
            "eventName": "wallet.delegation.revoked",
            "userId": "never-seen",
            "data": { "walletId": "w-9" }
        }))
        .unwrap();
        assert!(processor.process(&revoke).is_ok());
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let (_dir, storage) = storage();
        let processor = WebhookProcessor::new(&storage, None);

        let event: DelegationEvent = serde_json::from_value(serde_json::json!({
            "eventName": "wallet.transferred",
            "data": {}
        }))
        .unwrap();
        assert!(matches!(
            processor.process(&event).unwrap_err(),
            WebhookError::UnknownEventType(_)
        ));
    }

    #[test]
    fn ping_and_signature_events_ack() {
        let (_dir, storage) = storage();
        let processor = WebhookProcessor::new(&storage, None);

        let ping: DelegationEvent =
            serde_json::from_value(serde_json::json!({ "eventName": "ping", "data": {} })).unwrap();
        assert_eq!(processor.process(&ping).unwrap(), ProcessOutcome::Pong);

        let signature: DelegationEvent = serde_json::from_value(serde_json::json!({
            "eventName": "wallet.delegation.signature",
            "data": { "chainId": 84532, "operation": { "sender": "0xabc" } }
        }))
        .unwrap();
        assert_eq!(
            processor.process(&signature).unwrap(),
            ProcessOutcome::SignatureLogged
        );
    }
}
