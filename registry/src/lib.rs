//! Registry and orchestration for the moot governance core.
//!
//! The [`DaoRegistry`] is the single state aggregate: membership records,
//! the adapter/extension capability table, the proposal state machine, and
//! the owned [`Bank`](moot_bank::Bank) and
//! [`VotingEngine`](moot_voting::VotingEngine). External adapters drive it
//! through a small capability-gated surface and never touch ledger storage
//! directly.
//!
//! Every mutating operation takes `&mut DaoRegistry`, so the borrow checker
//! serializes core operations on one DAO the way the original host's
//! transaction model did. Validation always completes before the first
//! mutation, keeping each operation all-or-nothing.

pub mod adapter;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod member;
pub mod proposal;
pub mod registry;
pub mod snapshot;

pub use adapter::{AccessTable, AdapterEntry};
pub use config::{AdapterConfig, DaoConfig, GrantConfig};
pub use error::RegistryError;
pub use event::{DaoEvent, EventBus};
pub use logging::init_tracing;
pub use member::{Member, MemberStatus};
pub use proposal::{Proposal, ProposalStage};
pub use registry::{DaoRegistry, BANK_EXTENSION, REGISTRY_EXTENSION};
pub use snapshot::DaoSnapshot;
