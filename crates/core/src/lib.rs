//! `saldo-core` — domain foundation for the ledger service.
//!
//! This crate contains **pure domain** primitives (no infrastructure
//! concerns): account identity, movement model, validation, and the
//! domain error taxonomy.

pub mod account;
pub mod error;
pub mod movement;

pub use account::{AccountId, BalanceSummary};
pub use error::DomainError;
pub use movement::{Movement, MovementKind, NewMovement, MAX_DESCRIPTION_CHARS};
