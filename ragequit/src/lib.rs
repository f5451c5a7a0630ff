//! Ragequit: voluntary proportional withdrawal of a member's stake.
//!
//! A member burns shares and loot and receives, for each requested treasury
//! asset, `guild_balance * burn_units / pre_burn_total`, with the
//! denominator captured before any mutation so the burn cannot dilute the
//! payout.
//! Integer division truncates; residual dust stays in the guild treasury by
//! design.
//!
//! The processor is itself an adapter id: every ledger mutation it performs
//! goes through the same capability gate as any other adapter.

pub mod error;
pub mod processor;

pub use error::RagequitError;
pub use processor::{RagequitOutcome, RagequitProcessor};
