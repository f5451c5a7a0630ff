//! Ballots, timed voting windows, and the weighted tally.

use std::collections::{HashMap, HashSet};

use moot_types::{Address, ProposalId, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

use crate::error::VotingError;

/// Durations of the two tally windows, in seconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VotingConfig {
    /// How long votes are accepted after sponsorship.
    #[serde(default = "default_voting_period")]
    pub voting_period_secs: u64,

    /// Additional window after voting closes during which the result is
    /// frozen but not yet consumable, so dissenters can exit first.
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

fn default_voting_period() -> u64 {
    600
}

fn default_grace_period() -> u64 {
    600
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            voting_period_secs: default_voting_period(),
            grace_period_secs: default_grace_period(),
        }
    }
}

/// A voter's choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

/// Where a ballot sits in its lifecycle, derived from elapsed time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallotState {
    NotStarted,
    Open,
    Grace,
    Concluded,
}

/// Outcome of a tally.
///
/// `Pending` while the ballot is open or in grace; once concluded, `Pass`
/// iff yes outweighs no, `Fail` iff no outweighs yes, `Tie` on equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TallyResult {
    Pending,
    Pass,
    Fail,
    Tie,
}

/// Per-proposal tally state.
///
/// The weight snapshot is fixed at sponsorship time and never changes,
/// even if a voter's holdings change afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ballot {
    snapshot: HashMap<Address, TokenAmount>,
    yes: TokenAmount,
    no: TokenAmount,
    abstain: TokenAmount,
    voted: HashSet<Address>,
    opened_at: Timestamp,
    config: VotingConfig,
}

impl Ballot {
    fn new(snapshot: HashMap<Address, TokenAmount>, config: VotingConfig, opened_at: Timestamp) -> Self {
        Self {
            snapshot,
            yes: TokenAmount::ZERO,
            no: TokenAmount::ZERO,
            abstain: TokenAmount::ZERO,
            voted: HashSet::new(),
            opened_at,
            config,
        }
    }

    pub fn state(&self, now: Timestamp) -> BallotState {
        let voting = self.config.voting_period_secs;
        let full = voting.saturating_add(self.config.grace_period_secs);
        if !self.opened_at.has_expired(voting, now) {
            BallotState::Open
        } else if !self.opened_at.has_expired(full, now) {
            BallotState::Grace
        } else {
            BallotState::Concluded
        }
    }

    pub fn result(&self, now: Timestamp) -> TallyResult {
        match self.state(now) {
            BallotState::NotStarted | BallotState::Open | BallotState::Grace => TallyResult::Pending,
            BallotState::Concluded => {
                if self.yes > self.no {
                    TallyResult::Pass
                } else if self.no > self.yes {
                    TallyResult::Fail
                } else {
                    TallyResult::Tie
                }
            }
        }
    }

    pub fn yes_weight(&self) -> TokenAmount {
        self.yes
    }

    pub fn no_weight(&self) -> TokenAmount {
        self.no
    }

    pub fn abstain_weight(&self) -> TokenAmount {
        self.abstain
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voted.contains(voter)
    }

    /// The frozen voting weight for `voter`, if they were in the snapshot.
    pub fn weight_of(&self, voter: &Address) -> Option<TokenAmount> {
        self.snapshot.get(voter).copied()
    }

    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }
}

/// Tally engine over all ballots.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VotingEngine {
    ballots: HashMap<ProposalId, Ballot>,
}

impl VotingEngine {
    pub fn new() -> Self {
        Self {
            ballots: HashMap::new(),
        }
    }

    /// Open the tally window for a proposal with the sponsorship-time
    /// weight snapshot. Cannot be called twice for the same proposal.
    pub fn start_voting(
        &mut self,
        proposal: ProposalId,
        snapshot: HashMap<Address, TokenAmount>,
        config: VotingConfig,
        opened_at: Timestamp,
    ) -> Result<(), VotingError> {
        if self.ballots.contains_key(&proposal) {
            return Err(VotingError::AlreadyStarted(proposal));
        }
        self.ballots
            .insert(proposal, Ballot::new(snapshot, config, opened_at));
        Ok(())
    }

    /// Record a weighted vote. Returns the weight that was counted.
    pub fn submit_vote(
        &mut self,
        proposal: ProposalId,
        voter: &Address,
        choice: VoteChoice,
        now: Timestamp,
    ) -> Result<TokenAmount, VotingError> {
        let ballot = self
            .ballots
            .get_mut(&proposal)
            .ok_or(VotingError::BallotNotFound(proposal))?;

        let weight = ballot
            .snapshot
            .get(voter)
            .copied()
            .ok_or_else(|| VotingError::NotEligible(voter.clone()))?;
        if ballot.state(now) != BallotState::Open {
            return Err(VotingError::VotingClosed);
        }
        if ballot.voted.contains(voter) {
            return Err(VotingError::AlreadyVoted(voter.clone()));
        }

        let tally = match choice {
            VoteChoice::Yes => &mut ballot.yes,
            VoteChoice::No => &mut ballot.no,
            VoteChoice::Abstain => &mut ballot.abstain,
        };
        *tally = tally.checked_add(weight).ok_or(VotingError::Overflow)?;
        ballot.voted.insert(voter.clone());
        Ok(weight)
    }

    /// Ballot state for a proposal; `NotStarted` when no ballot exists.
    pub fn state(&self, proposal: ProposalId, now: Timestamp) -> BallotState {
        self.ballots
            .get(&proposal)
            .map(|b| b.state(now))
            .unwrap_or(BallotState::NotStarted)
    }

    /// Tally result for a proposal; `Pending` when no ballot exists or the
    /// windows have not elapsed.
    pub fn result(&self, proposal: ProposalId, now: Timestamp) -> TallyResult {
        self.ballots
            .get(&proposal)
            .map(|b| b.result(now))
            .unwrap_or(TallyResult::Pending)
    }

    pub fn ballot(&self, proposal: ProposalId) -> Option<&Ballot> {
        self.ballots.get(&proposal)
    }
}
