//! Adapter entries and the capability table.

use std::collections::HashMap;

use moot_types::{AccessPolicy, AdapterId, Address, Capability, CapabilitySet, ExtensionId};
use serde::{Deserialize, Serialize};

/// A registered adapter: its derived id and the target address the host
/// dispatches calls to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterEntry {
    pub id: AdapterId,
    pub address: Address,
}

/// The `(adapter, extension) → capabilities` table.
///
/// Lookup is default-deny: a missing row denies every capability.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessTable {
    grants: HashMap<(AdapterId, ExtensionId), CapabilitySet>,
}

impl AccessTable {
    pub fn new() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    /// Set the capability set for an (adapter, extension) pair, replacing
    /// any previous grant.
    pub fn grant(&mut self, adapter: AdapterId, extension: ExtensionId, capabilities: CapabilitySet) {
        self.grants.insert((adapter, extension), capabilities);
    }

    /// Drop every grant held by `adapter`, across all extensions.
    pub fn revoke_adapter(&mut self, adapter: AdapterId) {
        self.grants.retain(|(a, _), _| *a != adapter);
    }

    /// The capability set for a pair; empty when no row exists.
    pub fn capabilities(&self, adapter: AdapterId, extension: ExtensionId) -> CapabilitySet {
        self.grants
            .get(&(adapter, extension))
            .copied()
            .unwrap_or(CapabilitySet::EMPTY)
    }
}

impl AccessPolicy for AccessTable {
    fn has_access(
        &self,
        adapter: AdapterId,
        extension: ExtensionId,
        capability: Capability,
    ) -> bool {
        self.capabilities(adapter, extension).contains(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(name: &str) -> AdapterId {
        AdapterId::from_name(name)
    }

    fn extension(name: &str) -> ExtensionId {
        ExtensionId::from_name(name)
    }

    #[test]
    fn lookup_is_default_deny() {
        let table = AccessTable::new();
        assert!(!table.has_access(adapter("a"), extension("bank"), Capability::AddBalance));
    }

    #[test]
    fn grant_is_scoped_to_the_pair() {
        let mut table = AccessTable::new();
        table.grant(
            adapter("a"),
            extension("bank"),
            CapabilitySet::EMPTY.grant(Capability::AddBalance),
        );

        assert!(table.has_access(adapter("a"), extension("bank"), Capability::AddBalance));
        assert!(!table.has_access(adapter("a"), extension("bank"), Capability::Withdraw));
        assert!(!table.has_access(adapter("a"), extension("registry"), Capability::AddBalance));
        assert!(!table.has_access(adapter("b"), extension("bank"), Capability::AddBalance));
    }

    #[test]
    fn regrant_replaces_the_previous_set() {
        let mut table = AccessTable::new();
        table.grant(
            adapter("a"),
            extension("bank"),
            CapabilitySet::EMPTY.grant(Capability::AddBalance),
        );
        table.grant(
            adapter("a"),
            extension("bank"),
            CapabilitySet::EMPTY.grant(Capability::Withdraw),
        );

        assert!(!table.has_access(adapter("a"), extension("bank"), Capability::AddBalance));
        assert!(table.has_access(adapter("a"), extension("bank"), Capability::Withdraw));
    }

    #[test]
    fn revoke_adapter_drops_every_grant() {
        let mut table = AccessTable::new();
        table.grant(
            adapter("a"),
            extension("bank"),
            CapabilitySet::EMPTY.grant(Capability::AddBalance),
        );
        table.grant(
            adapter("a"),
            extension("registry"),
            CapabilitySet::EMPTY.grant(Capability::SubmitProposal),
        );
        table.revoke_adapter(adapter("a"));

        assert!(!table.has_access(adapter("a"), extension("bank"), Capability::AddBalance));
        assert!(!table.has_access(adapter("a"), extension("registry"), Capability::SubmitProposal));
    }
}
