//! Error types and HTTP error response handling.
//!
//! This module defines all application errors, how store failures are
//! classified as transient or permanent, and how errors are converted into
//! HTTP responses with appropriate status codes and JSON bodies.

use crate::models::character::CharacterId;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Transfer rule violations**: unknown character, same character on both
///   sides, not enough gold, non-positive amount. Permanent for the given input.
/// - **Validation Errors**: malformed character fields
/// - **Store Errors**: transient (lock timeout, deadlock, lost connection) or
///   permanent (anything else the database reports)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Store failure that is not worth retrying (constraint violation, bad SQL, ...).
    ///
    /// Returns HTTP 500 and hides details from the client.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Connectivity loss, lock-wait timeout, deadlock or serialization failure.
    ///
    /// The unit of work was rolled back; the caller may retry.
    /// Returns HTTP 503 Service Unavailable.
    #[error("Store temporarily unavailable: {0}")]
    TransientStore(String),

    /// Requested character does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Character {0} not found")]
    CharacterNotFound(CharacterId),

    /// Source and destination of a transfer are the same character.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Cannot transfer gold to the same character")]
    SameCharacter,

    /// Source character holds less gold than requested.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient gold: {available} available, {requested} requested")]
    InsufficientGold { available: i64, requested: i64 },

    /// Transfer amount is zero or negative.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Transfer amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Whether repeating the same call unchanged could succeed.
    ///
    /// Only transient store failures qualify; every other variant is
    /// permanent for the given input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransientStore(_))
    }

    /// Stable machine-readable error code used in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "internal_error",
            AppError::TransientStore(_) => "transient_store_error",
            AppError::CharacterNotFound(_) => "character_not_found",
            AppError::SameCharacter => "same_character",
            AppError::InsufficientGold { .. } => "insufficient_gold",
            AppError::InvalidAmount(_) => "invalid_amount",
            AppError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::CharacterNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientGold { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SameCharacter | AppError::InvalidAmount(_) | AppError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// Message safe to show to a client. Database internals are never exposed.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        // deadlock_detected, serialization_failure, lock_not_available, query_canceled
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some("40P01" | "40001" | "55P03" | "57014")
        ),
        _ => false,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            AppError::TransientStore(err.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

/// Body that is not JSON, or does not fit the expected shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Database(ref err) = self {
            tracing::error!(error = %err, "Database error");
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message()
            }
        }));

        (self.status_code(), body).into_response()
    }
}
