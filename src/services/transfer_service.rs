//! Gold transfer service - moves gold between two characters atomically.
//!
//! # Atomicity Guarantees
//!
//! The whole transfer runs in one store transaction. Both rows are locked
//! before anything is checked or written, sufficiency is re-checked against
//! the locked values, and the balances change by relative deltas. Any error
//! after the transaction opens drops the handle uncommitted, which rolls it
//! back.
//!
//! # Lock Ordering
//!
//! Rows are always locked in ascending id order regardless of transfer
//! direction. Two concurrent transfers A->B and B->A therefore queue on the
//! same first lock instead of each holding one row and waiting on the other.

use crate::{
    error::AppError,
    models::{
        character::CharacterId,
        transfer::{TransferOutcome, TransferReceipt, TransferRequest},
    },
    store::{BalanceStore, BalanceTransaction},
};

/// The two ids of a transfer in the order their rows must be locked.
pub fn lock_order(a: CharacterId, b: CharacterId) -> [CharacterId; 2] {
    if a <= b { [a, b] } else { [b, a] }
}

/// Roll back `tx` and return `err` unchanged. A failed rollback is logged,
/// never returned in place of `err`.
async fn abort(tx: Box<dyn BalanceTransaction>, err: AppError) -> AppError {
    if let Err(rollback_err) = tx.rollback().await {
        tracing::warn!(error = %rollback_err, cause = %err, "Rollback failed");
    }
    err
}

/// Execute a gold transfer.
///
/// # Process
///
/// 1. Reject non-positive amounts and same-character transfers
/// 2. Start store transaction
/// 3. Check existence and lock both rows, lower id first
/// 4. Validate source gold against the locked value
/// 5. Apply `-amount` / `+amount` deltas
/// 6. Commit (or roll back on any error)
///
/// # Errors
///
/// - `InvalidAmount`: amount is zero or negative
/// - `SameCharacter`: source equals destination
/// - `CharacterNotFound`: either character is missing
/// - `InsufficientGold`: source holds less than `amount`
/// - `TransientStore`: lock timeout, deadlock or connectivity loss
/// - `Database`: any other store failure
pub async fn execute_transfer<S>(
    store: &S,
    request: TransferRequest,
) -> Result<TransferReceipt, AppError>
where
    S: BalanceStore + ?Sized,
{
    let TransferRequest {
        from_id,
        to_id,
        amount,
    } = request;

    if amount <= 0 {
        return Err(AppError::InvalidAmount(amount));
    }

    if from_id == to_id {
        return Err(AppError::SameCharacter);
    }

    let mut tx = store.begin_transaction().await?;

    let mut from_gold = 0;
    let mut to_gold = 0;
    for id in lock_order(from_id, to_id) {
        if !tx.entity_exists(id).await? {
            return Err(abort(tx, AppError::CharacterNotFound(id)).await);
        }

        let gold = tx.lock_and_read_balance(id).await?;
        if id == from_id {
            from_gold = gold;
        } else {
            to_gold = gold;
        }
    }

    if from_gold < amount {
        let err = AppError::InsufficientGold {
            available: from_gold,
            requested: amount,
        };
        return Err(abort(tx, err).await);
    }

    tx.apply_balance_delta(from_id, -amount).await?;
    tx.apply_balance_delta(to_id, amount).await?;

    tx.commit().await?;

    Ok(TransferReceipt {
        from_id,
        to_id,
        amount,
        from_gold: from_gold - amount,
        to_gold: to_gold + amount,
    })
}

/// Transfer gold and report the result as an outcome instead of an error.
///
/// No failure escapes this function; every error becomes `ok: false` with
/// the reason in `message`. Nothing is retried here.
pub async fn transfer_balance<S>(
    store: &S,
    from_id: CharacterId,
    to_id: CharacterId,
    amount: i64,
) -> TransferOutcome
where
    S: BalanceStore + ?Sized,
{
    let request = TransferRequest {
        from_id,
        to_id,
        amount,
    };
    let result = execute_transfer(store, request).await;
    log_result(&request, &result);
    result.into()
}

pub(crate) fn log_result(request: &TransferRequest, result: &Result<TransferReceipt, AppError>) {
    match result {
        Ok(receipt) => tracing::info!(
            from_id = request.from_id,
            to_id = request.to_id,
            amount = request.amount,
            from_gold = receipt.from_gold,
            to_gold = receipt.to_gold,
            "Gold transfer committed"
        ),
        Err(err) => tracing::warn!(
            from_id = request.from_id,
            to_id = request.to_id,
            amount = request.amount,
            code = err.code(),
            retryable = err.is_retryable(),
            error = %err,
            "Gold transfer rejected"
        ),
    }
}
