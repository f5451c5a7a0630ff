use moot_registry::RegistryError;
use moot_types::{Capability, TokenAddress};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagequitError {
    #[error("insufficient shares: need {needed}, have {available}")]
    InsufficientShares { needed: u128, available: u128 },

    #[error("no assets requested for withdrawal")]
    MissingAssets,

    #[error("duplicate asset {0} in withdrawal list")]
    DuplicateAsset(TokenAddress),

    #[error("asset {0} is not allowed")]
    AssetNotAllowed(TokenAddress),

    #[error("payout overflow")]
    Overflow,

    #[error("ragequit adapter lacks required capability {0:?}")]
    MissingCapability(Capability),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
