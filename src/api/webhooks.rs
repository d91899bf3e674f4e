// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! Custody delegation webhook endpoint.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use crate::custody::{
    verify_signature, DelegationEvent, ProcessOutcome, WebhookProcessor, SIGNATURE_HEADER,
};
use crate::error::ApiError;
use crate::models::WebhookAck;
use crate::state::AppState;

/// Receive a delegation event from the custody service.
///
/// The HMAC signature covers the raw body bytes and is verified before any
/// JSON parsing. Events for the same wallet are applied serially.
#[utoipa::path(
    post,
    path = "/v1/webhooks/custody/delegation",
    tag = "Webhooks",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, body = WebhookAck),
        (status = 400, description = "Unknown event type or malformed payload"),
        (status = 401, description = "Signature verification failed"),
        (status = 404, description = "No wallet on file for the event's user")
    )
)]
pub async fn delegation_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_signature(&state.config.custody_webhook_secret, &body, signature)?;

    let event: DelegationEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request("malformed_payload", e.to_string()))?;

    tracing::info!(
        event_name = %event.event_name,
        message_id = event.message_id.as_deref(),
        "custody webhook received"
    );

    // Serialize events per wallet; unrelated wallets proceed concurrently.
    let _guard = match event.lock_key() {
        Some(key) => Some(state.wallet_locks.acquire(&key).await),
        None => None,
    };

    let processor = WebhookProcessor::new(&state.storage, state.config.delegation_key.as_ref());
    let outcome = processor.process(&event)?;

    let ack = match outcome {
        ProcessOutcome::DelegationStored { user_id, wallet_id } => WebhookAck {
            status: "success",
            message: "delegation materials stored".to_string(),
            user_id: Some(user_id),
            wallet_id: Some(wallet_id),
        },
        ProcessOutcome::DelegationCleared { user_id, wallet_id } => WebhookAck {
            status: "success",
            message: "delegation revoked".to_string(),
            user_id: Some(user_id),
            wallet_id: Some(wallet_id),
        },
        ProcessOutcome::SignatureLogged => WebhookAck::ok("signature event logged"),
        ProcessOutcome::Pong => WebhookAck::ok("pong"),
    };
    Ok(Json(ack))
}
