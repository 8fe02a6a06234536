//! In-memory ledger implementation.
//!
//! Test double for [`PostgresLedger`]: a per-account `tokio::sync::Mutex`
//! plays the role of the row lock, so the same contention behavior is
//! observable without a database. State is mutated only after every check
//! has passed, which gives the same all-or-nothing visibility as the
//! transactional engine.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use saldo_core::{AccountId, BalanceSummary, Movement, NewMovement};

use crate::{Ledger, Statement, StoreError, STATEMENT_LIMIT};

#[derive(Debug)]
struct AccountState {
    balance: i64,
    limit: i64,
    movements: Vec<Movement>,
}

/// In-memory [`Ledger`].
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<AccountId, Arc<Mutex<AccountState>>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an account. Replaces any existing state for the id.
    pub async fn insert_account(&self, id: AccountId, balance: i64, limit: i64) {
        let state = AccountState {
            balance,
            limit,
            movements: Vec::new(),
        };
        self.accounts
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(state)));
    }

    async fn account(&self, id: AccountId) -> Option<Arc<Mutex<AccountState>>> {
        self.accounts.read().await.get(&id).cloned()
    }
}

#[async_trait::async_trait]
impl Ledger for InMemoryLedger {
    async fn apply_movement(
        &self,
        account_id: AccountId,
        movement: &NewMovement,
    ) -> Result<BalanceSummary, StoreError> {
        let account = self.account(account_id).await.ok_or(StoreError::NotFound)?;

        // Per-account lock: the serialization point for this id.
        let mut state = account.lock().await;

        // Overflowing the i64 balance range is rejected like a floor
        // breach: the movement cannot be applied.
        let candidate = state
            .balance
            .checked_add(movement.kind.signed_delta(movement.value))
            .ok_or(StoreError::InvariantViolation)?;
        if candidate < -state.limit {
            return Err(StoreError::InvariantViolation);
        }

        state.movements.push(Movement {
            account_id,
            value: movement.value,
            kind: movement.kind,
            description: movement.description.clone(),
            occurred_at: Utc::now(),
        });
        state.balance = candidate;

        Ok(BalanceSummary {
            balance: candidate,
            limit: state.limit,
        })
    }

    async fn statement(&self, account_id: AccountId) -> Result<Statement, StoreError> {
        let account = self.account(account_id).await.ok_or(StoreError::NotFound)?;
        let state = account.lock().await;

        let movements: Vec<Movement> = state
            .movements
            .iter()
            .rev()
            .take(STATEMENT_LIMIT)
            .cloned()
            .collect();

        Ok(Statement {
            balance: state.balance,
            limit: state.limit,
            snapshot_time: Utc::now(),
            movements,
        })
    }
}
