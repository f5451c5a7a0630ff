//! Capability flags gating adapter access to core extensions.
//!
//! Every (adapter, extension) pair stores one [`CapabilitySet`] bitmap.
//! Access is fail-closed: absence of a bit denies the call.

use crate::id::{AdapterId, ExtensionId};
use serde::{Deserialize, Serialize};

/// A single capability an adapter may hold against an extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Credit an account (and the running supply).
    AddBalance,
    /// Debit an account (and the running supply).
    SubtractBalance,
    /// Move balance between accounts without changing supply.
    InternalTransfer,
    /// Zero a ledger balance and release the underlying asset.
    Withdraw,
    /// Add an external token to the allow-list.
    RegisterToken,
    /// Create a member record.
    NewMember,
    /// Jail (or re-admit) a member.
    JailMember,
    /// Submit a proposal to the registry.
    SubmitProposal,
    /// Sponsor a submitted proposal, opening its tally window.
    SponsorProposal,
    /// Finalize a sponsored proposal once voting has concluded.
    ProcessProposal,
    /// Replace, remove, or register adapters and extensions.
    ReplaceAdapter,
    /// Change a member's delegate key.
    UpdateDelegate,
}

impl Capability {
    /// Every capability, in bit order.
    pub const ALL: [Capability; 12] = [
        Capability::AddBalance,
        Capability::SubtractBalance,
        Capability::InternalTransfer,
        Capability::Withdraw,
        Capability::RegisterToken,
        Capability::NewMember,
        Capability::JailMember,
        Capability::SubmitProposal,
        Capability::SponsorProposal,
        Capability::ProcessProposal,
        Capability::ReplaceAdapter,
        Capability::UpdateDelegate,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A set of capabilities stored as a bitmap, one bit per [`Capability`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub const EMPTY: Self = Self(0);

    pub fn new() -> Self {
        Self(0)
    }

    /// Build a set from a slice of capabilities.
    pub fn from_capabilities(capabilities: &[Capability]) -> Self {
        capabilities.iter().fold(Self::EMPTY, |set, &c| set.grant(c))
    }

    /// Builder-style grant.
    pub fn grant(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the capabilities present in this set.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.iter().copied().filter(|c| self.contains(*c))
    }

    pub fn bits(&self) -> u16 {
        self.0
    }
}

/// Access-control lookup consulted before any gated mutation.
///
/// Implemented by the registry's capability table; the bank takes it as a
/// parameter so the gate is enforced at the mutation site.
pub trait AccessPolicy {
    /// Whether `adapter` holds `capability` for `extension`. Default-deny.
    fn has_access(
        &self,
        adapter: AdapterId,
        extension: ExtensionId,
        capability: Capability,
    ) -> bool;
}
