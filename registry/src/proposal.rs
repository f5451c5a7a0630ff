//! Proposal records and their monotonic stage machine.

use moot_types::{AdapterId, ProposalId};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a proposal.
///
/// Stages only ever move forward (Submitted → Sponsored → Processed) and
/// records are retained indefinitely so a proposal id can never be reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStage {
    Submitted,
    Sponsored,
    Processed,
}

/// A proposal record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    /// The adapter that submitted (and owns) this proposal.
    pub adapter: AdapterId,
    pub stage: ProposalStage,
}

impl Proposal {
    pub fn new(id: ProposalId, adapter: AdapterId) -> Self {
        Self {
            id,
            adapter,
            stage: ProposalStage::Submitted,
        }
    }
}
