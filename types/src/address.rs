//! Identity address type with `moot_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An identity address, always prefixed with `moot_`.
///
/// Identifies members, delegates, and adapter targets. The host environment
/// authenticates callers; the core only compares addresses.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The standard prefix for all moot addresses.
    pub const PREFIX: &'static str = "moot_";

    /// Create a new address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `moot_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with moot_");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
