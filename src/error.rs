// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::custody::{CustodyError, WebhookError};
use crate::relay::DispatchError;
use crate::signing::ResolveError;
use crate::storage::StorageError;

/// API-facing error with a stable machine-readable code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn unprocessable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, message)
    }

    pub fn bad_gateway(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, code, message)
    }

    pub fn service_unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }
        let body = Json(ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        });
        (self.status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => {
                ApiError::not_found("not_found", format!("not found: {what}"))
            }
            StorageError::Conflict(what) => ApiError::conflict("conflict", what),
            other => ApiError::internal("storage_error", other.to_string()),
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::MissingSignature | WebhookError::SignatureInvalid => {
                ApiError::unauthorized("signature_invalid", "webhook signature verification failed")
            }
            WebhookError::UnknownEventType(name) => {
                ApiError::bad_request("unknown_event_type", format!("unknown event type: {name}"))
            }
            WebhookError::MalformedPayload(e) => {
                ApiError::bad_request("malformed_payload", e.to_string())
            }
            WebhookError::WalletNotFound(what) => {
                ApiError::not_found("wallet_not_found", format!("no wallet on file: {what}"))
            }
            err @ (WebhookError::MissingSecret | WebhookError::MissingDecryptionKey) => {
                ApiError::internal("configuration_error", err.to_string())
            }
            WebhookError::Envelope(e) => {
                ApiError::internal("envelope_decrypt_failed", e.to_string())
            }
            WebhookError::Storage(e) => e.into(),
        }
    }
}

impl From<CustodyError> for ApiError {
    fn from(err: CustodyError) -> Self {
        ApiError::bad_gateway("custody_error", err.to_string())
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        ApiError::conflict("no_signing_material", err.to_string())
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(msg) => ApiError::bad_request("invalid_transaction", msg),
            DispatchError::RelayUnavailable(msg) => {
                ApiError::service_unavailable("relay_unavailable", msg)
            }
            DispatchError::InsufficientSponsorship(msg) => {
                ApiError::unprocessable("insufficient_sponsorship", msg)
            }
            DispatchError::InsufficientBalance(msg) => {
                ApiError::unprocessable("insufficient_balance", msg)
            }
            DispatchError::Rejected(msg) => {
                ApiError::bad_gateway("transaction_rejected", msg)
            }
            DispatchError::Custody(e) => e.into(),
        }
    }
}
