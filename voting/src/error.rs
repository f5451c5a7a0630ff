use moot_types::{Address, ProposalId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VotingError {
    #[error("ballot already started for proposal {0}")]
    AlreadyStarted(ProposalId),

    #[error("no ballot exists for proposal {0}")]
    BallotNotFound(ProposalId),

    #[error("{0} is not in the voting snapshot for this ballot")]
    NotEligible(Address),

    #[error("voting window has closed")]
    VotingClosed,

    #[error("{0} has already voted on this ballot")]
    AlreadyVoted(Address),

    #[error("tally overflow")]
    Overflow,
}
