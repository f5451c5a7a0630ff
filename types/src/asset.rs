//! Assets tracked by the internal ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of an external token, always prefixed with `tok_`.
///
/// The underlying asset lives outside the core; the ledger only tracks
/// balances denominated in it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAddress(String);

impl TokenAddress {
    /// The standard prefix for all external token addresses.
    pub const PREFIX: &'static str = "tok_";

    /// Create a new token address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `tok_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "token address must start with tok_");
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TokenAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// An asset the bank can hold a balance in.
///
/// `Shares` carry voting weight; `Loot` is economic-only stake. External
/// tokens must be on the bank's allow-list before they can be tracked.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Voting-weighted membership stake.
    Shares,
    /// Non-voting membership stake.
    Loot,
    /// An external treasury asset.
    Token(TokenAddress),
}

impl Asset {
    /// Internal assets (shares, loot) are always allowed; external tokens
    /// go through the allow-list.
    pub fn is_internal(&self) -> bool {
        matches!(self, Asset::Shares | Asset::Loot)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Shares => write!(f, "shares"),
            Asset::Loot => write!(f, "loot"),
            Asset::Token(addr) => write!(f, "{}", addr),
        }
    }
}
