//! The internal multi-asset ledger (Bank).
//!
//! Tracks per-account, per-asset balances plus a bounded external-token
//! allow-list. The two reserved accounts are `GUILD` (collective treasury)
//! and `TOTAL` (running per-asset supply, the denominator for proportional
//! withdrawal).
//!
//! Every mutating entry point is capability-gated through an
//! [`AccessPolicy`](moot_types::AccessPolicy): the calling adapter must hold
//! the required bit for this bank's extension id, and absence of the bit
//! denies the call.

pub mod bank;
pub mod error;

pub use bank::{BalanceChange, Bank, ChangeKind, CreditResult, Withdrawal};
pub use error::BankError;
