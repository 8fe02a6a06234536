use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use saldo_core::{BalanceSummary, Movement, MovementKind, NewMovement};
use saldo_store::Statement;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /accounts/{id}/movements`.
///
/// An unknown `kind` token or a non-integer `value` fails deserialization,
/// which the handler maps to 422 before the engine is reached.
#[derive(Debug, Deserialize)]
pub struct MovementRequest {
    pub value: i64,
    pub kind: MovementKind,
    pub description: String,
}

impl From<MovementRequest> for NewMovement {
    fn from(req: MovementRequest) -> Self {
        NewMovement {
            value: req.value,
            kind: req.kind,
            description: req.description,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub balance: i64,
    pub limit: i64,
}

impl From<BalanceSummary> for MovementResponse {
    fn from(summary: BalanceSummary) -> Self {
        Self {
            balance: summary.balance,
            limit: summary.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub balance: StatementBalance,
    pub recent_movements: Vec<MovementEntry>,
}

#[derive(Debug, Serialize)]
pub struct StatementBalance {
    pub total: i64,
    pub limit: i64,
    #[serde(serialize_with = "micros_utc")]
    pub snapshot_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MovementEntry {
    pub value: i64,
    pub kind: &'static str,
    pub description: String,
    #[serde(serialize_with = "micros_utc")]
    pub occurred_at: DateTime<Utc>,
}

impl From<Movement> for MovementEntry {
    fn from(m: Movement) -> Self {
        Self {
            value: m.value,
            kind: m.kind.as_str(),
            description: m.description,
            occurred_at: m.occurred_at,
        }
    }
}

impl From<Statement> for StatementResponse {
    fn from(statement: Statement) -> Self {
        Self {
            balance: StatementBalance {
                total: statement.balance,
                limit: statement.limit,
                snapshot_time: statement.snapshot_time,
            },
            recent_movements: statement
                .movements
                .into_iter()
                .map(MovementEntry::from)
                .collect(),
        }
    }
}

/// Fixed-format timestamp: RFC 3339, UTC `Z`, always six fractional
/// digits. Downstream consumers expect this exact byte shape.
fn micros_utc<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}
