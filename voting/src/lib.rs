//! Vote tally engine for the moot governance core.
//!
//! Each sponsored proposal gets a [`Ballot`]: a snapshot of voting weights
//! captured at sponsorship time (shares only; loot is non-voting),
//! weighted yes/no/abstain totals, and a per-voter record preventing double
//! voting. Ballot state is derived from elapsed time against the configured
//! voting and grace windows; there is no in-process waiting.

pub mod engine;
pub mod error;

pub use engine::{Ballot, BallotState, TallyResult, VoteChoice, VotingConfig, VotingEngine};
pub use error::VotingError;
