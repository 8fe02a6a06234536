//! Movement model and validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::error::DomainError;

/// Maximum description length, counted in Unicode scalar values.
pub const MAX_DESCRIPTION_CHARS: usize = 10;

/// Direction of a movement. The amount itself is always positive; the
/// kind carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Credit,
    Debit,
}

impl MovementKind {
    /// Signed delta this movement applies to a balance.
    pub fn signed_delta(&self, value: i64) -> i64 {
        match self {
            MovementKind::Credit => value,
            MovementKind::Debit => -value,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Credit => "credit",
            MovementKind::Debit => "debit",
        }
    }
}

impl core::str::FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(MovementKind::Credit),
            "debit" => Ok(MovementKind::Debit),
            other => Err(DomainError::validation(format!(
                "kind must be credit or debit, got {other:?}"
            ))),
        }
    }
}

/// A proposed movement, as submitted by a caller. Not yet persisted and
/// carries no timestamp; `occurred_at` is assigned by the engine when the
/// movement is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub value: i64,
    pub kind: MovementKind,
    pub description: String,
}

impl NewMovement {
    /// Validate the movement's shape. Pure; no side effects.
    ///
    /// Description length is counted in Unicode scalar values, not bytes.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.value <= 0 {
            return Err(DomainError::validation(format!(
                "value must be positive, got {}",
                self.value
            )));
        }

        let len = self.description.chars().count();
        if len < 1 || len > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::validation(format!(
                "description must be 1..={MAX_DESCRIPTION_CHARS} characters, got {len}"
            )));
        }

        Ok(())
    }
}

/// A recorded movement, as read back for a statement.
///
/// Immutable once persisted; the movement log is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub account_id: AccountId,
    pub value: i64,
    pub kind: MovementKind,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}
