//! Membership records.

use moot_types::Address;
use serde::{Deserialize, Serialize};

/// Membership status. Jailing is permanent until an explicit re-admission;
/// it is never lifted implicitly, even if the member's stake returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Active,
    Jailed,
}

/// A membership record.
///
/// Records are never deleted, only zeroed and jailed, so a fresh proposal
/// for a previously seen identity can never replay onboarding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    /// Delegate key allowed to act on the member's behalf.
    pub delegate: Option<Address>,
    pub status: MemberStatus,
}

impl Member {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            delegate: None,
            status: MemberStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}
