//! Account identity and balance summary.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an account.
///
/// Externally assigned, strictly positive. Accounts are provisioned out of
/// band; this service never mints new ids.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    /// Wrap a raw id, rejecting zero and negative values.
    pub fn new(id: i64) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::invalid_id(format!(
                "account id must be positive, got {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .parse()
            .map_err(|e| DomainError::invalid_id(format!("account id: {e}")))?;
        Self::new(raw)
    }
}

/// Post-movement view of an account: its new balance and its credit limit.
///
/// `limit` is the magnitude by which the balance may go negative; the
/// allowed balance range is `[-limit, +inf)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub balance: i64,
    pub limit: i64,
}
