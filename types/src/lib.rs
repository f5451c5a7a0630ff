//! Fundamental types for the moot governance core.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: addresses, amounts, assets, ledger accounts, identifiers,
//! capability flags, and timestamps.

pub mod account;
pub mod address;
pub mod amount;
pub mod asset;
pub mod capability;
pub mod id;
pub mod time;

pub use account::Account;
pub use address::Address;
pub use amount::TokenAmount;
pub use asset::{Asset, TokenAddress};
pub use capability::{AccessPolicy, Capability, CapabilitySet};
pub use id::{AdapterId, ExtensionId, ProposalId};
pub use time::Timestamp;
