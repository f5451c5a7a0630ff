use moot_bank::BankError;
use moot_types::{AdapterId, Address, Capability, ExtensionId, ProposalId};
use moot_voting::VotingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid proposal id")]
    InvalidProposalId,

    #[error("proposal id {0} has already been used")]
    DuplicateProposal(ProposalId),

    #[error("proposal {0} does not exist")]
    UnknownProposal(ProposalId),

    #[error("proposal {0} is already sponsored")]
    AlreadySponsored(ProposalId),

    #[error("proposal {0} is already processed")]
    AlreadyProcessed(ProposalId),

    #[error("voting has not concluded for proposal {0}")]
    VotingNotConcluded(ProposalId),

    #[error("adapter {0} is not registered")]
    AdapterNotFound(AdapterId),

    #[error("{0} is not an active member")]
    NotAMember(Address),

    #[error("invalid adapter id")]
    InvalidAdapterId,

    #[error("invalid extension id")]
    InvalidExtensionId,

    #[error("delegate key {0} is already in use")]
    DelegateInUse(Address),

    #[error("adapter {adapter} lacks {capability:?} on extension {extension}")]
    AccessDenied {
        adapter: AdapterId,
        extension: ExtensionId,
        capability: Capability,
    },

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Voting(#[from] VotingError),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("config error: {0}")]
    Config(String),
}
