use moot_types::{AdapterId, Asset, Capability, ExtensionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BankError {
    #[error("adapter {adapter} lacks {capability:?} on extension {extension}")]
    AccessDenied {
        adapter: AdapterId,
        extension: ExtensionId,
        capability: Capability,
    },

    #[error("asset {0} is not allowed")]
    AssetNotAllowed(Asset),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("token allow-list is full ({max} entries)")]
    AllowListFull { max: usize },

    #[error("balance overflow")]
    Overflow,
}
