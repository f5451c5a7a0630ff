//! Ledger accounts, including the two reserved accounts.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account the bank holds balances for.
///
/// `Guild` is the collective treasury. `Total` tracks the running supply per
/// asset and serves as the denominator for proportional withdrawal. Both are
/// reserved; every other balance belongs to a `Holder`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Account {
    /// The collective treasury.
    Guild,
    /// Running per-asset supply.
    Total,
    /// An individual holder (member or applicant).
    Holder(Address),
}

impl Account {
    pub fn holder(address: Address) -> Self {
        Account::Holder(address)
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, Account::Guild | Account::Total)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Guild => write!(f, "GUILD"),
            Account::Total => write!(f, "TOTAL"),
            Account::Holder(addr) => write!(f, "{}", addr),
        }
    }
}
