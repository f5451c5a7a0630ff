//! DAO configuration with TOML file support.
//!
//! Loaded once at DAO initialization: voting/grace window durations, the
//! external-token allow-list bound, and the initial adapter/extension
//! capability wiring. Can be loaded from a TOML file via
//! [`DaoConfig::from_toml_file`] or built programmatically (e.g. for tests).

use std::path::Path;

use moot_types::Capability;
use moot_voting::VotingConfig;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Configuration for one DAO instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoConfig {
    /// How long votes are accepted after sponsorship, in seconds.
    #[serde(default = "default_voting_period")]
    pub voting_period_secs: u64,

    /// Grace window after voting closes, in seconds.
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,

    /// Maximum number of external tokens on the bank allow-list. Bounds the
    /// cost of full-allow-list iteration during ragequit.
    #[serde(default = "default_max_external_tokens")]
    pub max_external_tokens: usize,

    /// Initial adapter wiring.
    #[serde(default, rename = "adapter")]
    pub adapters: Vec<AdapterConfig>,
}

/// One adapter's initial registration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Name the adapter id is derived from.
    pub name: String,
    /// Target address the host dispatches this adapter's calls to.
    pub address: String,
    /// Capability grants, one per extension.
    #[serde(default, rename = "grant")]
    pub grants: Vec<GrantConfig>,
}

/// A capability grant against one extension.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrantConfig {
    /// Extension name the id is derived from (e.g. `"bank"`, `"registry"`).
    pub extension: String,
    pub capabilities: Vec<Capability>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_voting_period() -> u64 {
    600
}

fn default_grace_period() -> u64 {
    600
}

fn default_max_external_tokens() -> usize {
    200
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            voting_period_secs: default_voting_period(),
            grace_period_secs: default_grace_period(),
            max_external_tokens: default_max_external_tokens(),
            adapters: Vec::new(),
        }
    }
}

impl DaoConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("read {}: {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| RegistryError::Config(e.to_string()))
    }

    /// The window durations in the tally engine's shape.
    pub fn voting_config(&self) -> VotingConfig {
        VotingConfig {
            voting_period_secs: self.voting_period_secs,
            grace_period_secs: self.grace_period_secs,
        }
    }
}
