//! Postgres-backed ledger engine.
//!
//! The account row lock (`SELECT ... FOR UPDATE`) is the sole concurrency
//! primitive: concurrent movements on the same account serialize on it,
//! movements on different accounts proceed in parallel. Lock acquisition
//! is bounded by `SET LOCAL lock_timeout` so a contended unit of work
//! fails with a retryable error instead of blocking indefinitely.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use saldo_core::{AccountId, BalanceSummary, Movement, MovementKind, NewMovement};

use crate::{map_sqlx_error, Ledger, Statement, StoreError, STATEMENT_LIMIT};

/// SQL for the initial schema, applied idempotently by [`PostgresLedger::migrate`].
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres implementation of [`Ledger`].
///
/// Holds the shared connection pool; cloning is cheap. Each unit of work
/// acquires one pooled connection and releases it on every exit path.
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override the row-lock acquisition timeout.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migration. Idempotent.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    /// Drain and close the pool. Called once on process shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl Ledger for PostgresLedger {
    #[instrument(skip(self, movement), fields(account_id = %account_id, kind = movement.kind.as_str()), err)]
    async fn apply_movement(
        &self,
        account_id: AccountId,
        movement: &NewMovement,
    ) -> Result<BalanceSummary, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        // lock_timeout cannot be bound as a parameter; the value is a
        // process-configured integer, not caller input.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("set_lock_timeout", e))?;

        // Serialization point: exclusive row lock, held until commit/rollback.
        let row = sqlx::query(
            r#"
            SELECT balance, credit_limit
            FROM accounts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(account_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_account", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound);
        };

        let balance: i64 = row
            .try_get("balance")
            .map_err(|e| StoreError::Persistence(format!("failed to read balance: {e}")))?;
        let limit: i64 = row
            .try_get("credit_limit")
            .map_err(|e| StoreError::Persistence(format!("failed to read credit_limit: {e}")))?;

        // Overflowing the i64 balance range is rejected like a floor
        // breach: the movement cannot be applied.
        let candidate = match balance.checked_add(movement.kind.signed_delta(movement.value)) {
            Some(candidate) => candidate,
            None => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::InvariantViolation);
            }
        };
        if candidate < -limit {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::InvariantViolation);
        }

        let occurred_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO movements (account_id, value, kind, description, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account_id.get())
        .bind(movement.value)
        .bind(movement.kind.as_str())
        .bind(&movement.description)
        .bind(occurred_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;

        sqlx::query("UPDATE accounts SET balance = $1 WHERE id = $2")
            .bind(candidate)
            .bind(account_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_balance", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;

        Ok(BalanceSummary {
            balance: candidate,
            limit,
        })
    }

    #[instrument(skip(self), fields(account_id = %account_id), err)]
    async fn statement(&self, account_id: AccountId) -> Result<Statement, StoreError> {
        // No lock: a statement is a point-in-time view, stale by
        // milliseconds at worst.
        let row = sqlx::query("SELECT balance, credit_limit FROM accounts WHERE id = $1")
            .bind(account_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("read_account", e))?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };

        let balance: i64 = row
            .try_get("balance")
            .map_err(|e| StoreError::Persistence(format!("failed to read balance: {e}")))?;
        let limit: i64 = row
            .try_get("credit_limit")
            .map_err(|e| StoreError::Persistence(format!("failed to read credit_limit: {e}")))?;

        let rows = sqlx::query(
            r#"
            SELECT account_id, value, kind, description, occurred_at
            FROM movements
            WHERE account_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(account_id.get())
        .bind(STATEMENT_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("read_movements", e))?;

        let mut movements = Vec::with_capacity(rows.len());
        for row in rows {
            let mapped = MovementRow::from_row(&row).map_err(|e| {
                StoreError::Persistence(format!("failed to decode movement row: {e}"))
            })?;
            movements.push(mapped.try_into()?);
        }

        Ok(Statement {
            balance,
            limit,
            snapshot_time: Utc::now(),
            movements,
        })
    }
}

// Explicit positional-column mapping; no runtime reflection.

#[derive(Debug)]
struct MovementRow {
    account_id: i64,
    value: i64,
    kind: String,
    description: String,
    occurred_at: DateTime<Utc>,
}

impl MovementRow {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            account_id: row.try_get("account_id")?,
            value: row.try_get("value")?,
            kind: row.try_get("kind")?,
            description: row.try_get("description")?,
            occurred_at: row.try_get("occurred_at")?,
        })
    }
}

impl TryFrom<MovementRow> for Movement {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let kind: MovementKind = row
            .kind
            .parse()
            .map_err(|_| StoreError::Persistence(format!("unknown movement kind {:?}", row.kind)))?;
        let account_id = AccountId::new(row.account_id)
            .map_err(|e| StoreError::Persistence(format!("bad account id in row: {e}")))?;

        Ok(Movement {
            account_id,
            value: row.value,
            kind,
            description: row.description,
            occurred_at: row.occurred_at,
        })
    }
}
