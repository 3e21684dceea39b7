//! Gold transfer request/response types.

use serde::{Deserialize, Serialize};

use super::character::CharacterId;
use crate::error::AppError;

/// Request to move gold from one character to another.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_id": 1,
///   "to_id": 2,
///   "amount": 30
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransferRequest {
    pub from_id: CharacterId,
    pub to_id: CharacterId,
    pub amount: i64,
}

/// Result of a committed transfer, with both balances as of the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub from_id: CharacterId,
    pub to_id: CharacterId,
    pub amount: i64,
    pub from_gold: i64,
    pub to_gold: i64,
}

/// Outcome reported to callers of the transfer operation.
///
/// Exactly one of a success message or a failure reason is reported per call.
///
/// # JSON Example
///
/// ```json
/// {
///   "ok": false,
///   "message": "Gold transfer failed: Insufficient gold: 70 available, 1000 requested",
///   "code": "insufficient_gold",
///   "retryable": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub ok: bool,
    pub message: String,

    /// Error code of the failure, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,

    /// Whether the same call may succeed if repeated
    pub retryable: bool,

    /// Balances after the transfer, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<TransferReceipt>,
}

impl From<Result<TransferReceipt, AppError>> for TransferOutcome {
    fn from(result: Result<TransferReceipt, AppError>) -> Self {
        match result {
            Ok(receipt) => Self {
                ok: true,
                message: format!(
                    "Transferred {} gold from character {} to character {}",
                    receipt.amount, receipt.from_id, receipt.to_id
                ),
                code: None,
                retryable: false,
                receipt: Some(receipt),
            },
            Err(err) => Self {
                ok: false,
                message: format!("Gold transfer failed: {}", err.public_message()),
                code: Some(err.code()),
                retryable: err.is_retryable(),
                receipt: None,
            },
        }
    }
}
