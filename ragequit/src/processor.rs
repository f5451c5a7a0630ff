//! The two-phase ragequit flow: validate everything, then apply.

use std::collections::HashSet;

use moot_registry::DaoRegistry;
use moot_types::{
    Account, AdapterId, Address, Asset, Capability, TokenAddress, TokenAmount,
};
use serde::{Deserialize, Serialize};

use crate::error::RagequitError;

/// What a completed ragequit did.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RagequitOutcome {
    pub burned_shares: TokenAmount,
    pub burned_loot: TokenAmount,
    /// Per-asset amounts moved from the guild treasury to the member.
    pub payouts: Vec<(TokenAddress, TokenAmount)>,
    /// Whether the member exited fully and was jailed.
    pub jailed: bool,
}

/// The ragequit processor.
///
/// Registered as an adapter holding `SubtractBalance` and
/// `InternalTransfer` on the bank and `JailMember` on the registry; every
/// mutation below goes through those gates.
#[derive(Clone, Copy, Debug)]
pub struct RagequitProcessor {
    adapter_id: AdapterId,
}

impl RagequitProcessor {
    /// Name the processor's adapter id is derived from.
    pub const ADAPTER_NAME: &'static str = "ragequit";

    pub fn new() -> Self {
        Self {
            adapter_id: AdapterId::from_name(Self::ADAPTER_NAME),
        }
    }

    pub fn adapter_id(&self) -> AdapterId {
        self.adapter_id
    }

    /// Burn `shares_to_burn` + `loot_to_burn` of `member`'s stake and pay
    /// out the proportional slice of each asset in `assets`.
    ///
    /// Validation completes before the first mutation: once the apply phase
    /// starts, no check below can fail, which keeps the operation
    /// all-or-nothing without host transaction support.
    pub fn ragequit(
        &self,
        dao: &mut DaoRegistry,
        member: &Address,
        shares_to_burn: TokenAmount,
        loot_to_burn: TokenAmount,
        assets: &[TokenAddress],
    ) -> Result<RagequitOutcome, RagequitError> {
        let holder = Account::Holder(member.clone());

        // Holdings checks.
        let shares_held = dao.balance_of(&holder, &Asset::Shares);
        if shares_to_burn > shares_held {
            return Err(RagequitError::InsufficientShares {
                needed: shares_to_burn.raw(),
                available: shares_held.raw(),
            });
        }
        let loot_held = dao.balance_of(&holder, &Asset::Loot);
        if loot_to_burn > loot_held {
            return Err(RagequitError::InsufficientShares {
                needed: loot_to_burn.raw(),
                available: loot_held.raw(),
            });
        }

        // Asset list checks.
        if assets.is_empty() {
            return Err(RagequitError::MissingAssets);
        }
        let mut seen = HashSet::new();
        for token in assets {
            if !seen.insert(token) {
                return Err(RagequitError::DuplicateAsset(token.clone()));
            }
            if !dao.is_asset_allowed(&Asset::Token(token.clone())) {
                return Err(RagequitError::AssetNotAllowed(token.clone()));
            }
        }

        // Capability pre-flight, so a misconfigured wiring cannot abort the
        // apply phase halfway through.
        let bank = dao.bank_extension_id();
        let registry = dao.registry_extension_id();
        for (extension, capability) in [
            (bank, Capability::InternalTransfer),
            (bank, Capability::SubtractBalance),
            (registry, Capability::JailMember),
        ] {
            if !dao.has_access(self.adapter_id, extension, capability) {
                return Err(RagequitError::MissingCapability(capability));
            }
        }

        // The denominator is captured before any mutation: burning first
        // would shrink it and inflate the payout.
        let burn_units = shares_to_burn
            .checked_add(loot_to_burn)
            .ok_or(RagequitError::Overflow)?;
        let pre_burn_total = dao
            .balance_of(&Account::Total, &Asset::Shares)
            .checked_add(dao.balance_of(&Account::Total, &Asset::Loot))
            .ok_or(RagequitError::Overflow)?;

        let mut payouts = Vec::with_capacity(assets.len());
        for token in assets {
            let guild_balance = dao.balance_of(&Account::Guild, &Asset::Token(token.clone()));
            let payout = if pre_burn_total.is_zero() {
                TokenAmount::ZERO
            } else {
                let raw = guild_balance
                    .raw()
                    .checked_mul(burn_units.raw())
                    .ok_or(RagequitError::Overflow)?
                    / pre_burn_total.raw();
                TokenAmount::new(raw)
            };
            payouts.push((token.clone(), payout));
        }

        // Apply phase.
        for (token, payout) in &payouts {
            dao.internal_transfer(
                self.adapter_id,
                Account::Guild,
                holder.clone(),
                Asset::Token(token.clone()),
                *payout,
            )?;
        }
        dao.subtract_from_balance(self.adapter_id, holder.clone(), Asset::Shares, shares_to_burn)?;
        dao.subtract_from_balance(self.adapter_id, holder.clone(), Asset::Loot, loot_to_burn)?;

        // A full exit jails the member; re-admission is a separate explicit
        // step.
        let remaining = dao
            .balance_of(&holder, &Asset::Shares)
            .checked_add(dao.balance_of(&holder, &Asset::Loot))
            .ok_or(RagequitError::Overflow)?;
        let jailed = remaining.is_zero() && dao.member(member).is_some();
        if jailed {
            dao.jail_member(self.adapter_id, member)?;
        }

        tracing::info!(
            member = %member,
            shares = %shares_to_burn,
            loot = %loot_to_burn,
            jailed,
            "ragequit executed"
        );

        Ok(RagequitOutcome {
            burned_shares: shares_to_burn,
            burned_loot: loot_to_burn,
            payouts,
            jailed,
        })
    }
}

impl Default for RagequitProcessor {
    fn default() -> Self {
        Self::new()
    }
}
