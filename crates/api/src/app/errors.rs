use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use saldo_store::StoreError;

/// Map a store error to its HTTP status.
///
/// Only `NotFound` gets 404; validation, invariant, and persistence
/// failures are all 422 so automated clients can tell "rejected or
/// retryable" from "no such account" by status alone.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "account not found"),
        StoreError::InvariantViolation => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invariant_violation",
            "movement would breach the credit limit",
        ),
        StoreError::Persistence(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "store_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
