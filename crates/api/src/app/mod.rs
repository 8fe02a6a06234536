//! HTTP application wiring (axum router + shared ledger handle).
//!
//! Layout:
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use saldo_store::Ledger;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and
/// the black-box tests).
///
/// The ledger handle is the only cross-request shared state; it is passed
/// in explicitly, never a global.
pub fn build_app(ledger: Arc<dyn Ledger>) -> Router {
    routes::router().layer(Extension(ledger))
}
