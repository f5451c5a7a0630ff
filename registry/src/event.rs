//! Events emitted by core operations for external indexing collaborators.

use moot_bank::ChangeKind;
use moot_types::{Account, AdapterId, Address, Asset, ExtensionId, ProposalId, TokenAddress, TokenAmount};
use moot_voting::{TallyResult, VoteChoice};

/// Core events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug)]
pub enum DaoEvent {
    /// A proposal entered the registry.
    ProposalSubmitted {
        proposal: ProposalId,
        adapter: AdapterId,
    },
    /// A member opened the proposal's tally window.
    ProposalSponsored {
        proposal: ProposalId,
        sponsor: Address,
    },
    /// A proposal was finalized with the given outcome.
    ProposalProcessed {
        proposal: ProposalId,
        outcome: TallyResult,
    },
    /// A weighted vote was counted.
    VoteSubmitted {
        proposal: ProposalId,
        voter: Address,
        choice: VoteChoice,
        weight: TokenAmount,
    },
    /// A member record was created.
    MemberAdded { member: Address },
    /// A member was jailed.
    MemberJailed { member: Address },
    /// A jailed member was explicitly re-admitted.
    MemberReadmitted { member: Address },
    /// A member's delegate key changed.
    DelegateUpdated {
        member: Address,
        delegate: Option<Address>,
    },
    /// A ledger balance moved.
    BalanceChanged {
        account: Account,
        asset: Asset,
        amount: TokenAmount,
        kind: ChangeKind,
    },
    /// An external token joined the allow-list.
    TokenAllowed { token: TokenAddress },
    /// A ledger balance was released to the external payout collaborator.
    Withdrawal {
        account: Account,
        asset: Asset,
        amount: TokenAmount,
    },
    /// An adapter was registered or its entry replaced.
    AdapterReplaced { adapter: AdapterId },
    /// An adapter was deregistered.
    AdapterRemoved { adapter: AdapterId },
    /// An extension was registered.
    ExtensionRegistered { extension: ExtensionId },
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread; keep handlers fast
/// to avoid stalling core operations.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&DaoEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&DaoEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &DaoEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn member() -> Address {
        Address::new("moot_member")
    }

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&DaoEvent::MemberAdded { member: member() });

        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&DaoEvent::MemberJailed { member: member() }); // should not panic
    }

    #[test]
    fn listener_receives_correct_event_variant() {
        let saw_added = Arc::new(AtomicUsize::new(0));
        let saw_jailed = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let sa = Arc::clone(&saw_added);
        let sj = Arc::clone(&saw_jailed);
        bus.subscribe(Box::new(move |event| match event {
            DaoEvent::MemberAdded { .. } => {
                sa.fetch_add(1, Ordering::SeqCst);
            }
            DaoEvent::MemberJailed { .. } => {
                sj.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }));

        bus.emit(&DaoEvent::MemberAdded { member: member() });
        bus.emit(&DaoEvent::MemberJailed { member: member() });

        assert_eq!(saw_added.load(Ordering::SeqCst), 1);
        assert_eq!(saw_jailed.load(Ordering::SeqCst), 1);
    }
}
