//! `saldo-store` — persistence layer: the ledger transaction engine and
//! the statement reader.
//!
//! The [`Ledger`] trait is the seam between the HTTP surface and storage.
//! Two implementations are provided:
//!
//! - [`PostgresLedger`]: production engine. Serializes conflicting
//!   movements on the same account with a `SELECT ... FOR UPDATE` row
//!   lock inside a single transaction.
//! - [`InMemoryLedger`]: test double obeying the same contract, with a
//!   per-account async mutex standing in for the row lock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use saldo_core::{AccountId, BalanceSummary, Movement, NewMovement};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;

/// Maximum number of movements returned in a statement.
pub const STATEMENT_LIMIT: usize = 10;

/// Point-in-time view of an account: balance, limit, and its most recent
/// movements (newest first, at most [`STATEMENT_LIMIT`] entries).
///
/// The balance read and the movement list read are deliberately not
/// mutually transactional; the statement reflects "approximately now".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub balance: i64,
    pub limit: i64,
    pub snapshot_time: DateTime<Utc>,
    pub movements: Vec<Movement>,
}

/// Storage-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The target account does not exist.
    #[error("account not found")]
    NotFound,

    /// The movement would push the balance below `-limit`. Business-rule
    /// rejection, not a bug; nothing was persisted.
    #[error("movement would breach the credit limit")]
    InvariantViolation,

    /// The store is unavailable, a lock acquisition timed out, or a
    /// commit failed. Transient; the caller may retry.
    #[error("store failure: {0}")]
    Persistence(String),
}

/// The ledger storage contract.
///
/// `apply_movement` is the transactional balance-mutation engine: one
/// movement applied to one account as an atomic, isolated unit of work.
/// On any error path zero side effects are visible. The engine performs
/// no retries itself.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Apply a validated movement to an account, enforcing
    /// `balance >= -limit`, and return the new balance and the limit.
    async fn apply_movement(
        &self,
        account_id: AccountId,
        movement: &NewMovement,
    ) -> Result<BalanceSummary, StoreError>;

    /// Read the account's balance/limit plus its most recent movements,
    /// newest first, capped at [`STATEMENT_LIMIT`].
    async fn statement(&self, account_id: AccountId) -> Result<Statement, StoreError>;
}

/// Map sqlx errors to `StoreError`.
///
/// Postgres error codes of interest:
/// - `55P03` (lock_not_available): bounded lock acquisition timed out.
/// - `57014` (query_canceled): statement deadline expired mid-flight.
/// - `23514` (check violation): the schema-level invariant backstop fired,
///   which only happens if the engine's own check was bypassed.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                if code.as_ref() == "23514" {
                    return StoreError::InvariantViolation;
                }
                if code.as_ref() == "55P03" {
                    return StoreError::Persistence(format!(
                        "lock acquisition timed out in {operation}"
                    ));
                }
            }
            StoreError::Persistence(format!(
                "database error in {operation}: {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Persistence(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Persistence(format!("connection pool timed out in {operation}"))
        }
        _ => StoreError::Persistence(format!("sqlx error in {operation}: {err}")),
    }
}
