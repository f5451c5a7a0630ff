//! The DAO state aggregate and its capability-gated operation surface.

use std::collections::HashMap;

use moot_bank::{Bank, Withdrawal};
use moot_types::{
    AccessPolicy, Account, AdapterId, Address, Asset, Capability, CapabilitySet, ExtensionId,
    ProposalId, Timestamp, TokenAddress, TokenAmount,
};
use moot_voting::{TallyResult, VoteChoice, VotingEngine};
use serde::{Deserialize, Serialize};

use crate::adapter::{AccessTable, AdapterEntry};
use crate::config::DaoConfig;
use crate::error::RegistryError;
use crate::event::{DaoEvent, EventBus};
use crate::member::{Member, MemberStatus};
use crate::proposal::{Proposal, ProposalStage};

/// Name the registry's own extension id is derived from.
pub const REGISTRY_EXTENSION: &str = "registry";

/// Name the bank's extension id is derived from.
pub const BANK_EXTENSION: &str = "bank";

/// The DAO state aggregate.
///
/// Created once from a [`DaoConfig`] with an immutable initial capability
/// wiring; every later mutation goes through a capability-gated method.
#[derive(Debug, Serialize, Deserialize)]
pub struct DaoRegistry {
    config: DaoConfig,
    registry_extension: ExtensionId,
    extensions: HashMap<ExtensionId, String>,
    members: HashMap<Address, Member>,
    /// Delegate key → delegating member address.
    delegates: HashMap<Address, Address>,
    proposals: HashMap<ProposalId, Proposal>,
    adapters: HashMap<AdapterId, AdapterEntry>,
    acl: AccessTable,
    bank: Bank,
    voting: VotingEngine,
    #[serde(skip)]
    events: EventBus,
}

impl DaoRegistry {
    /// Build a DAO from its initial configuration.
    ///
    /// Initial wiring is not capability-gated: the configuration surface is
    /// trusted, loaded once, and immutable afterwards.
    pub fn from_config(config: DaoConfig) -> Result<Self, RegistryError> {
        let registry_extension = ExtensionId::from_name(REGISTRY_EXTENSION);
        let bank_extension = ExtensionId::from_name(BANK_EXTENSION);

        let mut extensions = HashMap::new();
        extensions.insert(registry_extension, REGISTRY_EXTENSION.to_string());
        extensions.insert(bank_extension, BANK_EXTENSION.to_string());

        let mut adapters = HashMap::new();
        let mut acl = AccessTable::new();
        for adapter_config in &config.adapters {
            if !adapter_config.address.starts_with(Address::PREFIX) {
                return Err(RegistryError::Config(format!(
                    "invalid adapter address {}",
                    adapter_config.address
                )));
            }
            let id = AdapterId::from_name(&adapter_config.name);
            adapters.insert(
                id,
                AdapterEntry {
                    id,
                    address: Address::new(adapter_config.address.clone()),
                },
            );
            for grant in &adapter_config.grants {
                let extension = ExtensionId::from_name(&grant.extension);
                acl.grant(id, extension, CapabilitySet::from_capabilities(&grant.capabilities));
            }
        }

        let bank = Bank::new(bank_extension, config.max_external_tokens);

        tracing::info!(
            adapters = adapters.len(),
            voting_period = config.voting_period_secs,
            grace_period = config.grace_period_secs,
            "dao registry initialized"
        );

        Ok(Self {
            config,
            registry_extension,
            extensions,
            members: HashMap::new(),
            delegates: HashMap::new(),
            proposals: HashMap::new(),
            adapters,
            acl,
            bank,
            voting: VotingEngine::new(),
            events: EventBus::new(),
        })
    }

    // ── Proposal state machine ─────────────────────────────────────────

    /// Record a new proposal owned by `caller`.
    pub fn submit_proposal(
        &mut self,
        caller: AdapterId,
        proposal: ProposalId,
    ) -> Result<(), RegistryError> {
        self.check_registry_access(caller, Capability::SubmitProposal)?;
        if proposal.is_zero() {
            return Err(RegistryError::InvalidProposalId);
        }
        if self.proposals.contains_key(&proposal) {
            return Err(RegistryError::DuplicateProposal(proposal));
        }

        self.proposals.insert(proposal, Proposal::new(proposal, caller));
        tracing::debug!(proposal = %proposal, adapter = %caller, "proposal submitted");
        self.events
            .emit(&DaoEvent::ProposalSubmitted { proposal, adapter: caller });
        Ok(())
    }

    /// Sponsor a submitted proposal, snapshotting voting weights and opening
    /// its tally window.
    pub fn sponsor_proposal(
        &mut self,
        caller: AdapterId,
        proposal: ProposalId,
        sponsor: &Address,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        self.check_registry_access(caller, Capability::SponsorProposal)?;
        let stage = self
            .proposals
            .get(&proposal)
            .ok_or(RegistryError::UnknownProposal(proposal))?
            .stage;
        match stage {
            ProposalStage::Submitted => {}
            ProposalStage::Sponsored | ProposalStage::Processed => {
                return Err(RegistryError::AlreadySponsored(proposal));
            }
        }
        let sponsor_address = self.resolve_active_member(sponsor)?.address.clone();

        // Voting weight is fixed here: every ACTIVE member's share balance
        // at sponsorship time.
        let snapshot: HashMap<Address, TokenAmount> = self
            .members
            .values()
            .filter(|m| m.is_active())
            .map(|m| {
                let weight = self
                    .bank
                    .balance_of(&Account::Holder(m.address.clone()), &Asset::Shares);
                (m.address.clone(), weight)
            })
            .collect();

        self.voting
            .start_voting(proposal, snapshot, self.config.voting_config(), now)?;
        if let Some(record) = self.proposals.get_mut(&proposal) {
            record.stage = ProposalStage::Sponsored;
        }

        tracing::info!(proposal = %proposal, sponsor = %sponsor_address, "proposal sponsored");
        self.events.emit(&DaoEvent::ProposalSponsored {
            proposal,
            sponsor: sponsor_address,
        });
        Ok(())
    }

    /// Record a vote on a sponsored proposal.
    pub fn submit_vote(
        &mut self,
        caller: AdapterId,
        proposal: ProposalId,
        voter: &Address,
        choice: VoteChoice,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        if !self.adapters.contains_key(&caller) {
            return Err(RegistryError::AdapterNotFound(caller));
        }
        let voter_address = self.resolve_active_member(voter)?.address.clone();
        if !self.proposals.contains_key(&proposal) {
            return Err(RegistryError::UnknownProposal(proposal));
        }

        let weight = self.voting.submit_vote(proposal, &voter_address, choice, now)?;
        tracing::debug!(proposal = %proposal, voter = %voter_address, ?choice, %weight, "vote submitted");
        self.events.emit(&DaoEvent::VoteSubmitted {
            proposal,
            voter: voter_address,
            choice,
            weight,
        });
        Ok(())
    }

    /// Finalize a proposal once its voting and grace windows have elapsed.
    ///
    /// Returns the tally outcome for adapter-specific execution.
    pub fn process_proposal(
        &mut self,
        caller: AdapterId,
        proposal: ProposalId,
        now: Timestamp,
    ) -> Result<TallyResult, RegistryError> {
        self.check_registry_access(caller, Capability::ProcessProposal)?;
        let (owner, stage) = {
            let record = self
                .proposals
                .get(&proposal)
                .ok_or(RegistryError::UnknownProposal(proposal))?;
            (record.adapter, record.stage)
        };
        if stage == ProposalStage::Processed {
            return Err(RegistryError::AlreadyProcessed(proposal));
        }

        let outcome = self.voting.result(proposal, now);
        if outcome == TallyResult::Pending {
            return Err(RegistryError::VotingNotConcluded(proposal));
        }
        // The owning adapter may have been deregistered after sponsorship;
        // this call must not silently succeed in that case.
        if !self.adapters.contains_key(&owner) {
            return Err(RegistryError::AdapterNotFound(owner));
        }

        if let Some(record) = self.proposals.get_mut(&proposal) {
            record.stage = ProposalStage::Processed;
        }
        tracing::info!(proposal = %proposal, ?outcome, "proposal processed");
        self.events
            .emit(&DaoEvent::ProposalProcessed { proposal, outcome });
        Ok(outcome)
    }

    // ── Membership ─────────────────────────────────────────────────────

    /// Create a member record. Idempotent for existing members.
    pub fn new_member(&mut self, caller: AdapterId, address: &Address) -> Result<(), RegistryError> {
        self.check_registry_access(caller, Capability::NewMember)?;
        if self.members.contains_key(address) {
            return Ok(());
        }
        self.members
            .insert(address.clone(), Member::new(address.clone()));
        tracing::info!(member = %address, "member added");
        self.events.emit(&DaoEvent::MemberAdded {
            member: address.clone(),
        });
        Ok(())
    }

    /// Jail a member: every membership-gated check fails from here on,
    /// independent of residual stake.
    pub fn jail_member(&mut self, caller: AdapterId, address: &Address) -> Result<(), RegistryError> {
        self.check_registry_access(caller, Capability::JailMember)?;
        let member = self
            .members
            .get_mut(address)
            .ok_or_else(|| RegistryError::NotAMember(address.clone()))?;
        if member.status == MemberStatus::Jailed {
            return Ok(());
        }
        member.status = MemberStatus::Jailed;
        tracing::warn!(member = %address, "member jailed");
        self.events.emit(&DaoEvent::MemberJailed {
            member: address.clone(),
        });
        Ok(())
    }

    /// Explicitly re-admit a jailed member. Jailing is never lifted
    /// implicitly, even if the member's stake returns.
    pub fn readmit_member(
        &mut self,
        caller: AdapterId,
        address: &Address,
    ) -> Result<(), RegistryError> {
        self.check_registry_access(caller, Capability::JailMember)?;
        let member = self
            .members
            .get_mut(address)
            .ok_or_else(|| RegistryError::NotAMember(address.clone()))?;
        if member.status == MemberStatus::Active {
            return Ok(());
        }
        member.status = MemberStatus::Active;
        tracing::info!(member = %address, "member re-admitted");
        self.events.emit(&DaoEvent::MemberReadmitted {
            member: address.clone(),
        });
        Ok(())
    }

    /// Change a member's delegate key.
    pub fn update_delegate(
        &mut self,
        caller: AdapterId,
        address: &Address,
        delegate: Option<Address>,
    ) -> Result<(), RegistryError> {
        self.check_registry_access(caller, Capability::UpdateDelegate)?;
        if !self.members.contains_key(address) {
            return Err(RegistryError::NotAMember(address.clone()));
        }
        if let Some(key) = &delegate {
            let taken_by_other = self
                .delegates
                .get(key)
                .map(|owner| owner != address)
                .unwrap_or(false);
            if taken_by_other || (self.members.contains_key(key) && key != address) {
                return Err(RegistryError::DelegateInUse(key.clone()));
            }
        }

        let member = self
            .members
            .get_mut(address)
            .ok_or_else(|| RegistryError::NotAMember(address.clone()))?;
        if let Some(old) = member.delegate.take() {
            self.delegates.remove(&old);
        }
        member.delegate = delegate.clone();
        if let Some(key) = &delegate {
            self.delegates.insert(key.clone(), address.clone());
        }

        tracing::debug!(member = %address, "delegate updated");
        self.events.emit(&DaoEvent::DelegateUpdated {
            member: address.clone(),
            delegate,
        });
        Ok(())
    }

    // ── Adapter and extension management ───────────────────────────────

    /// Register or replace an adapter, overwriting its capability grants.
    ///
    /// Gated so governance-driven upgrades cannot be abused for privilege
    /// escalation.
    pub fn replace_adapter(
        &mut self,
        caller: AdapterId,
        entry: AdapterEntry,
        grants: Vec<(ExtensionId, CapabilitySet)>,
    ) -> Result<(), RegistryError> {
        self.check_registry_access(caller, Capability::ReplaceAdapter)?;
        if entry.id.is_zero() {
            return Err(RegistryError::InvalidAdapterId);
        }

        let id = entry.id;
        self.acl.revoke_adapter(id);
        for (extension, capabilities) in grants {
            self.acl.grant(id, extension, capabilities);
        }
        self.adapters.insert(id, entry);

        tracing::info!(adapter = %id, "adapter replaced");
        self.events.emit(&DaoEvent::AdapterReplaced { adapter: id });
        Ok(())
    }

    /// Deregister an adapter and drop all its grants. Proposals it owns
    /// become unprocessable (`AdapterNotFound`).
    pub fn remove_adapter(&mut self, caller: AdapterId, id: AdapterId) -> Result<(), RegistryError> {
        self.check_registry_access(caller, Capability::ReplaceAdapter)?;
        if self.adapters.remove(&id).is_none() {
            return Err(RegistryError::AdapterNotFound(id));
        }
        self.acl.revoke_adapter(id);

        tracing::info!(adapter = %id, "adapter removed");
        self.events.emit(&DaoEvent::AdapterRemoved { adapter: id });
        Ok(())
    }

    /// Register an additional extension by name.
    pub fn register_extension(
        &mut self,
        caller: AdapterId,
        name: &str,
    ) -> Result<ExtensionId, RegistryError> {
        self.check_registry_access(caller, Capability::ReplaceAdapter)?;
        let id = ExtensionId::from_name(name);
        if id.is_zero() {
            return Err(RegistryError::InvalidExtensionId);
        }
        self.extensions.insert(id, name.to_string());

        tracing::info!(extension = %id, name, "extension registered");
        self.events.emit(&DaoEvent::ExtensionRegistered { extension: id });
        Ok(id)
    }

    // ── Ledger surface (capability checks happen inside the bank) ──────

    /// Credit an account. A GUILD credit may bootstrap a new token onto the
    /// allow-list.
    pub fn add_to_balance(
        &mut self,
        caller: AdapterId,
        account: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<(), RegistryError> {
        let result = self
            .bank
            .add_to_balance(&self.acl, caller, account, asset, amount)?;
        if let Some(token) = result.newly_allowed {
            self.events.emit(&DaoEvent::TokenAllowed { token });
        }
        for change in result.changes {
            self.events.emit(&DaoEvent::BalanceChanged {
                account: change.account,
                asset: change.asset,
                amount: change.amount,
                kind: change.kind,
            });
        }
        Ok(())
    }

    /// Debit an account and the running supply.
    pub fn subtract_from_balance(
        &mut self,
        caller: AdapterId,
        account: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<(), RegistryError> {
        let changes = self
            .bank
            .subtract_from_balance(&self.acl, caller, account, asset, amount)?;
        for change in changes {
            self.events.emit(&DaoEvent::BalanceChanged {
                account: change.account,
                asset: change.asset,
                amount: change.amount,
                kind: change.kind,
            });
        }
        Ok(())
    }

    /// Move balance between accounts without changing supply.
    pub fn internal_transfer(
        &mut self,
        caller: AdapterId,
        from: Account,
        to: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<(), RegistryError> {
        let changes = self
            .bank
            .internal_transfer(&self.acl, caller, from, to, asset, amount)?;
        for change in changes {
            self.events.emit(&DaoEvent::BalanceChanged {
                account: change.account,
                asset: change.asset,
                amount: change.amount,
                kind: change.kind,
            });
        }
        Ok(())
    }

    /// Debit a balance and signal the external payout collaborator.
    pub fn withdraw(
        &mut self,
        caller: AdapterId,
        account: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<Withdrawal, RegistryError> {
        let (receipt, changes) = self
            .bank
            .withdraw(&self.acl, caller, account, asset, amount)?;
        for change in changes {
            self.events.emit(&DaoEvent::BalanceChanged {
                account: change.account,
                asset: change.asset,
                amount: change.amount,
                kind: change.kind,
            });
        }
        tracing::info!(account = %receipt.account, asset = %receipt.asset, amount = %receipt.amount, "withdrawal");
        self.events.emit(&DaoEvent::Withdrawal {
            account: receipt.account.clone(),
            asset: receipt.asset.clone(),
            amount: receipt.amount,
        });
        Ok(receipt)
    }

    /// Add an external token to the bank allow-list.
    pub fn register_token(
        &mut self,
        caller: AdapterId,
        token: TokenAddress,
    ) -> Result<(), RegistryError> {
        let newly_added = self.bank.register_token(&self.acl, caller, token.clone())?;
        if newly_added {
            self.events.emit(&DaoEvent::TokenAllowed { token });
        }
        Ok(())
    }

    // ── Read surface ───────────────────────────────────────────────────

    /// Pure capability lookup, default-deny.
    pub fn has_access(
        &self,
        adapter: AdapterId,
        extension: ExtensionId,
        capability: Capability,
    ) -> bool {
        self.acl.has_access(adapter, extension, capability)
    }

    pub fn balance_of(&self, account: &Account, asset: &Asset) -> TokenAmount {
        self.bank.balance_of(account, asset)
    }

    pub fn is_asset_allowed(&self, asset: &Asset) -> bool {
        self.bank.is_asset_allowed(asset)
    }

    pub fn proposal(&self, proposal: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&proposal)
    }

    pub fn proposal_stage(&self, proposal: ProposalId) -> Option<ProposalStage> {
        self.proposals.get(&proposal).map(|p| p.stage)
    }

    pub fn tally_result(&self, proposal: ProposalId, now: Timestamp) -> TallyResult {
        self.voting.result(proposal, now)
    }

    pub fn member(&self, address: &Address) -> Option<&Member> {
        self.members.get(address)
    }

    pub fn is_active_member(&self, address: &Address) -> bool {
        self.members.get(address).map(Member::is_active).unwrap_or(false)
    }

    pub fn adapter(&self, id: AdapterId) -> Option<&AdapterEntry> {
        self.adapters.get(&id)
    }

    pub fn registry_extension_id(&self) -> ExtensionId {
        self.registry_extension
    }

    pub fn bank_extension_id(&self) -> ExtensionId {
        self.bank.extension_id()
    }

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    /// Subscribe to core events.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&DaoEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn check_registry_access(
        &self,
        caller: AdapterId,
        capability: Capability,
    ) -> Result<(), RegistryError> {
        if self.acl.has_access(caller, self.registry_extension, capability) {
            Ok(())
        } else {
            Err(RegistryError::AccessDenied {
                adapter: caller,
                extension: self.registry_extension,
                capability,
            })
        }
    }

    /// Resolve a caller address (member or delegate key) to an ACTIVE
    /// member.
    fn resolve_active_member(&self, address: &Address) -> Result<&Member, RegistryError> {
        let member = self
            .members
            .get(address)
            .or_else(|| {
                self.delegates
                    .get(address)
                    .and_then(|owner| self.members.get(owner))
            })
            .ok_or_else(|| RegistryError::NotAMember(address.clone()))?;
        if !member.is_active() {
            return Err(RegistryError::NotAMember(address.clone()));
        }
        Ok(member)
    }
}
