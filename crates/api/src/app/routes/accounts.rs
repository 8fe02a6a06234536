use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use saldo_core::{AccountId, NewMovement};
use saldo_store::Ledger;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id/movements", post(post_movement))
        .route("/:id/statement", get(get_statement))
}

/// Ids arrive as raw path segments; anything that is not a positive
/// integer is 404, matching "no such account".
fn parse_account_id(raw: &str) -> Result<AccountId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "account id must be a positive integer",
        )
    })
}

pub async fn post_movement(
    Extension(ledger): Extension<Arc<dyn Ledger>>,
    Path(id): Path<String>,
    body: Result<Json<dto::MovementRequest>, JsonRejection>,
) -> axum::response::Response {
    let account_id = match parse_account_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "malformed_body",
                rejection.body_text(),
            )
        }
    };

    let movement = NewMovement::from(body);
    if let Err(e) = movement.validate() {
        return errors::json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation", e.to_string());
    }

    match ledger.apply_movement(account_id, &movement).await {
        Ok(summary) => {
            (StatusCode::OK, Json(dto::MovementResponse::from(summary))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_statement(
    Extension(ledger): Extension<Arc<dyn Ledger>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let account_id = match parse_account_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match ledger.statement(account_id).await {
        Ok(statement) => (
            StatusCode::OK,
            Json(dto::StatementResponse::from(statement)),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
