// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Hybrid-encrypted delegation envelopes.
//!
//! Delegation webhook payloads carry key material wrapped in an RSA-OAEP +
//! AES-256-GCM envelope: `ek` is the AES key encrypted to our delegation RSA
//! public key, and `ct`/`iv`/`tag` are the GCM ciphertext, nonce and auth tag.
//! All fields are standard base64.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64ct::{Base64, Encoding};
use rsa::{Oaep, RsaPrivateKey};
use serde::Deserialize;
use sha2::Sha256;

/// Wire shape of an encrypted delegation field.
#[derive(Debug, Clone, Deserialize)]
pub struct EncryptedEnvelope {
    /// Envelope algorithm identifier, e.g. "RSA-OAEP-256+A256GCM".
    #[serde(default)]
    pub alg: Option<String>,
    /// Base64 AES-GCM ciphertext.
    pub ct: String,
    /// Base64 RSA-encrypted AES key.
    pub ek: String,
    /// Base64 GCM nonce.
    pub iv: String,
    /// Base64 GCM authentication tag.
    pub tag: String,
    /// Optional key id of the RSA key the envelope was encrypted to.
    #[serde(default)]
    pub kid: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("invalid base64 in envelope field `{field}`")]
    Base64 { field: &'static str },

    #[error("RSA key unwrap failed")]
    KeyUnwrap,

    #[error("unwrapped key has unexpected length {0}")]
    KeyLength(usize),

    #[error("nonce has unexpected length {0}")]
    NonceLength(usize),

    #[error("ciphertext authentication failed")]
    Decrypt,

    #[error("decrypted payload is not valid UTF-8")]
    Utf8,
}

/// RSA private key used to unwrap delegation envelopes.
pub struct DelegationDecryptionKey {
    key: RsaPrivateKey,
}

impl DelegationDecryptionKey {
    pub fn new(key: RsaPrivateKey) -> Self {
        Self { key }
    }

    /// Decrypt an envelope to its UTF-8 plaintext.
    pub fn decrypt(&self, envelope: &EncryptedEnvelope) -> Result<String, EnvelopeError> {
        let ek = decode_field(&envelope.ek, "ek")?;
        let ct = decode_field(&envelope.ct, "ct")?;
        let iv = decode_field(&envelope.iv, "iv")?;
        let tag = decode_field(&envelope.tag, "tag")?;

        let aes_key = self
            .key
            .decrypt(Oaep::new::<Sha256>(), &ek)
            .map_err(|_| EnvelopeError::KeyUnwrap)?;
        if aes_key.len() != 32 {
            return Err(EnvelopeError::KeyLength(aes_key.len()));
        }

        if iv.len() != 12 {
            return Err(EnvelopeError::NonceLength(iv.len()));
        }

        let cipher = Aes256Gcm::new_from_slice(&aes_key)
            .map_err(|_| EnvelopeError::KeyLength(aes_key.len()))?;
        let nonce = Nonce::from_slice(&iv);

        // aes-gcm expects ciphertext || tag as one buffer.
        let mut sealed = ct;
        sealed.extend_from_slice(&tag);

        let plaintext = cipher
            .decrypt(nonce, sealed.as_ref())
            .map_err(|_| EnvelopeError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| EnvelopeError::Utf8)
    }
}

fn decode_field(value: &str, field: &'static str) -> Result<Vec<u8>, EnvelopeError> {
    Base64::decode_vec(value).map_err(|_| EnvelopeError::Base64 { field })
}


#[cfg(test)]
mod tests {
    use super::test_support::encrypt_for;
    use super::*;
    use rsa::RsaPublicKey;

    fn keypair() -> (DelegationDecryptionKey, RsaPublicKey) {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        (DelegationDecryptionKey::new(private), public)
    }

    #[test]
    fn decrypts_what_the_custody_side_encrypts() {
        let (key, public) = keypair();
        let envelope = encrypt_for(&public, "delegated-key-share-material");
        assert_eq!(
            key.decrypt(&envelope).unwrap(),
            "delegated-key-share-material"
        );
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let (key, public) = keypair();
        let mut envelope = encrypt_for(&public, "secret");
        let mut ct = Base64::decode_vec(&envelope.ct).unwrap();
        ct[0] ^= 0x01;
        envelope.ct = Base64::encode_string(&ct);
        assert!(matches!(
            key.decrypt(&envelope).unwrap_err(),
            EnvelopeError::Decrypt
        ));
    }

    #[test]
    fn wrong_key_fails_unwrap() {
        let (_, public) = keypair();
        let (other_key, _) = keypair();
        let envelope = encrypt_for(&public, "secret");
        assert!(matches!(
            other_key.decrypt(&envelope).unwrap_err(),
            EnvelopeError::KeyUnwrap
        ));
    }

    #[test]
    fn bad_base64_is_reported_per_field() {
        let (key, public) = keypair();
        let mut envelope = encrypt_for(&public, "secret");
        envelope.iv = "!!not-base64!!".into();
        assert!(matches!(
            key.decrypt(&envelope).unwrap_err(),
            EnvelopeError::Base64 { field: "iv" }
        ));
    }
}
