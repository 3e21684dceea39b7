//! Gold transfer HTTP handler.

use crate::{
    error::AppError,
    models::transfer::{TransferOutcome, TransferReceipt, TransferRequest},
    routes::AppState,
    services::transfer_service,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

/// Transfer gold between characters.
///
/// # Endpoint
///
/// `POST /api/v1/transfers`
///
/// # Request Body
///
/// ```json
/// { "from_id": 1, "to_id": 2, "amount": 30 }
/// ```
///
/// # Response
///
/// Always a `TransferOutcome` body, malformed requests included. The status
/// is 200 when the transfer committed and the error's status otherwise
/// (400, 404, 422, 503, 500).
///
/// ```json
/// {
///   "ok": true,
///   "message": "Transferred 30 gold from character 1 to character 2",
///   "retryable": false,
///   "receipt": { "from_id": 1, "to_id": 2, "amount": 30, "from_gold": 70, "to_gold": 80 }
/// }
/// ```
///
/// # Atomicity
///
/// Both balances change in one store transaction or not at all.
pub async fn create_transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> (StatusCode, Json<TransferOutcome>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = AppError::from(rejection);
            tracing::warn!(error = %err, "Rejected malformed transfer request");
            let outcome = TransferOutcome::from(Err::<TransferReceipt, _>(err));
            return (StatusCode::BAD_REQUEST, Json(outcome));
        }
    };

    let result = transfer_service::execute_transfer(state.store.as_ref(), request).await;
    transfer_service::log_result(&request, &result);

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(err) => err.status_code(),
    };

    (status, Json(result.into()))
}
