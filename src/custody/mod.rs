// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Integration with the external custody provider: management API client,
//! delegation webhook verification and processing, and envelope decryption.

pub mod client;
pub mod envelope;
pub mod events;
pub mod webhook;

pub use client::{CustodyClient, CustodyError, CustodySession, CustodyWallet};
pub use envelope::{DelegationDecryptionKey, EncryptedEnvelope, EnvelopeError};
pub use events::{DelegationEvent, EventKind};
pub use webhook::{verify_signature, ProcessOutcome, WebhookError, WebhookProcessor, SIGNATURE_HEADER};
