//! Balance table, allow-list, and the capability-gated mutation surface.

use std::collections::{HashMap, HashSet};

use moot_types::{
    AccessPolicy, Account, AdapterId, Asset, Capability, ExtensionId, TokenAddress, TokenAmount,
};
use serde::{Deserialize, Serialize};

use crate::error::BankError;

/// Direction of a balance mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Credit,
    Debit,
}

/// A single applied balance mutation, reported back to the orchestrator so
/// it can fan the change out to event subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub account: Account,
    pub asset: Asset,
    pub amount: TokenAmount,
    pub kind: ChangeKind,
}

/// Result of a credit, including a token implicitly registered by the
/// GUILD bootstrap rule.
#[derive(Clone, Debug)]
pub struct CreditResult {
    pub changes: Vec<BalanceChange>,
    pub newly_allowed: Option<TokenAddress>,
}

/// Receipt handed to the external payout collaborator: the ledger balance
/// has been zeroed and `amount` of the underlying asset must be released.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub account: Account,
    pub asset: Asset,
    pub amount: TokenAmount,
}

/// The internal ledger.
///
/// Balances are created implicitly on first credit and persist at zero
/// rather than being removed. `Shares` and `Loot` are always allowed;
/// external tokens must be on the bounded allow-list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bank {
    extension_id: ExtensionId,
    balances: HashMap<(Account, Asset), TokenAmount>,
    allowed_tokens: HashSet<TokenAddress>,
    max_external_tokens: usize,
}

impl Bank {
    pub fn new(extension_id: ExtensionId, max_external_tokens: usize) -> Self {
        Self {
            extension_id,
            balances: HashMap::new(),
            allowed_tokens: HashSet::new(),
            max_external_tokens,
        }
    }

    /// The extension id capability grants are checked against.
    pub fn extension_id(&self) -> ExtensionId {
        self.extension_id
    }

    /// Read a balance; zero for unknown pairs.
    pub fn balance_of(&self, account: &Account, asset: &Asset) -> TokenAmount {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Whether the asset may be tracked. Internal assets always are.
    pub fn is_asset_allowed(&self, asset: &Asset) -> bool {
        match asset {
            Asset::Shares | Asset::Loot => true,
            Asset::Token(token) => self.allowed_tokens.contains(token),
        }
    }

    pub fn allowed_token_count(&self) -> usize {
        self.allowed_tokens.len()
    }

    pub fn max_external_tokens(&self) -> usize {
        self.max_external_tokens
    }

    /// Add an external token to the allow-list.
    ///
    /// Returns `true` if the token was newly added, `false` if it was
    /// already present.
    pub fn register_token(
        &mut self,
        policy: &dyn AccessPolicy,
        caller: AdapterId,
        token: TokenAddress,
    ) -> Result<bool, BankError> {
        self.check_access(policy, caller, Capability::RegisterToken)?;
        self.allow_token(token)
    }

    /// Credit an account and the running supply.
    ///
    /// A credit to `GUILD` in an unregistered token registers the token
    /// implicitly while the allow-list has room (the bootstrap rule).
    pub fn add_to_balance(
        &mut self,
        policy: &dyn AccessPolicy,
        caller: AdapterId,
        account: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<CreditResult, BankError> {
        self.check_access(policy, caller, Capability::AddBalance)?;

        // Fail-closed asset validation; only a GUILD credit may bootstrap a
        // new token, and only while the allow-list has room.
        let newly_allowed = if self.is_asset_allowed(&asset) {
            None
        } else {
            match (&account, &asset) {
                (Account::Guild, Asset::Token(token)) => {
                    if self.allowed_tokens.len() >= self.max_external_tokens {
                        return Err(BankError::AllowListFull {
                            max: self.max_external_tokens,
                        });
                    }
                    Some(token.clone())
                }
                _ => return Err(BankError::AssetNotAllowed(asset)),
            }
        };

        // Pre-compute both legs so a failure cannot leave a partial credit.
        let new_account = self
            .balance_of(&account, &asset)
            .checked_add(amount)
            .ok_or(BankError::Overflow)?;
        let new_total = self
            .balance_of(&Account::Total, &asset)
            .checked_add(amount)
            .ok_or(BankError::Overflow)?;

        if let Some(token) = &newly_allowed {
            self.allowed_tokens.insert(token.clone());
        }
        self.balances.insert((account.clone(), asset.clone()), new_account);
        self.balances.insert((Account::Total, asset.clone()), new_total);

        Ok(CreditResult {
            changes: vec![
                BalanceChange {
                    account,
                    asset: asset.clone(),
                    amount,
                    kind: ChangeKind::Credit,
                },
                BalanceChange {
                    account: Account::Total,
                    asset,
                    amount,
                    kind: ChangeKind::Credit,
                },
            ],
            newly_allowed,
        })
    }

    /// Debit an account and the running supply.
    pub fn subtract_from_balance(
        &mut self,
        policy: &dyn AccessPolicy,
        caller: AdapterId,
        account: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<Vec<BalanceChange>, BankError> {
        self.check_access(policy, caller, Capability::SubtractBalance)?;
        self.debit_with_supply(account, asset, amount)
    }

    /// Move balance between two accounts without touching the supply.
    ///
    /// Both legs are applied together; validation happens before either.
    pub fn internal_transfer(
        &mut self,
        policy: &dyn AccessPolicy,
        caller: AdapterId,
        from: Account,
        to: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<Vec<BalanceChange>, BankError> {
        self.check_access(policy, caller, Capability::InternalTransfer)?;
        if !self.is_asset_allowed(&asset) {
            return Err(BankError::AssetNotAllowed(asset));
        }

        let from_balance = self.balance_of(&from, &asset);
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or(BankError::InsufficientFunds {
                needed: amount.raw(),
                available: from_balance.raw(),
            })?;

        // A self-transfer is validated like any other but leaves the
        // balance untouched.
        if from != to {
            let new_to = self
                .balance_of(&to, &asset)
                .checked_add(amount)
                .ok_or(BankError::Overflow)?;
            self.balances.insert((from.clone(), asset.clone()), new_from);
            self.balances.insert((to.clone(), asset.clone()), new_to);
        }

        Ok(vec![
            BalanceChange {
                account: from,
                asset: asset.clone(),
                amount,
                kind: ChangeKind::Debit,
            },
            BalanceChange {
                account: to,
                asset,
                amount,
                kind: ChangeKind::Credit,
            },
        ])
    }

    /// Debit a balance and hand back a receipt for the external payout
    /// collaborator to release the underlying asset.
    pub fn withdraw(
        &mut self,
        policy: &dyn AccessPolicy,
        caller: AdapterId,
        account: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<(Withdrawal, Vec<BalanceChange>), BankError> {
        self.check_access(policy, caller, Capability::Withdraw)?;
        let changes = self.debit_with_supply(account.clone(), asset.clone(), amount)?;
        Ok((
            Withdrawal {
                account,
                asset,
                amount,
            },
            changes,
        ))
    }

    fn check_access(
        &self,
        policy: &dyn AccessPolicy,
        caller: AdapterId,
        capability: Capability,
    ) -> Result<(), BankError> {
        if policy.has_access(caller, self.extension_id, capability) {
            Ok(())
        } else {
            Err(BankError::AccessDenied {
                adapter: caller,
                extension: self.extension_id,
                capability,
            })
        }
    }

    fn allow_token(&mut self, token: TokenAddress) -> Result<bool, BankError> {
        if self.allowed_tokens.contains(&token) {
            return Ok(false);
        }
        if self.allowed_tokens.len() >= self.max_external_tokens {
            return Err(BankError::AllowListFull {
                max: self.max_external_tokens,
            });
        }
        self.allowed_tokens.insert(token);
        Ok(true)
    }

    fn debit_with_supply(
        &mut self,
        account: Account,
        asset: Asset,
        amount: TokenAmount,
    ) -> Result<Vec<BalanceChange>, BankError> {
        if !self.is_asset_allowed(&asset) {
            return Err(BankError::AssetNotAllowed(asset));
        }

        let balance = self.balance_of(&account, &asset);
        let new_account = balance
            .checked_sub(amount)
            .ok_or(BankError::InsufficientFunds {
                needed: amount.raw(),
                available: balance.raw(),
            })?;
        let total = self.balance_of(&Account::Total, &asset);
        let new_total = total
            .checked_sub(amount)
            .ok_or(BankError::InsufficientFunds {
                needed: amount.raw(),
                available: total.raw(),
            })?;

        self.balances.insert((account.clone(), asset.clone()), new_account);
        self.balances.insert((Account::Total, asset.clone()), new_total);

        Ok(vec![
            BalanceChange {
                account,
                asset: asset.clone(),
                amount,
                kind: ChangeKind::Debit,
            },
            BalanceChange {
                account: Account::Total,
                asset,
                amount,
                kind: ChangeKind::Debit,
            },
        ])
    }

    /// Sum of every non-`TOTAL` balance in `asset`. Exposed for
    /// conservation checks.
    pub fn circulating_sum(&self, asset: &Asset) -> Option<TokenAmount> {
        self.balances
            .iter()
            .filter(|((account, a), _)| a == asset && *account != Account::Total)
            .try_fold(TokenAmount::ZERO, |acc, (_, amount)| acc.checked_add(*amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moot_types::Address;

    struct AllowAll;

    impl AccessPolicy for AllowAll {
        fn has_access(&self, _: AdapterId, _: ExtensionId, _: Capability) -> bool {
            true
        }
    }

    struct DenyAll;

    impl AccessPolicy for DenyAll {
        fn has_access(&self, _: AdapterId, _: ExtensionId, _: Capability) -> bool {
            false
        }
    }

    fn test_bank() -> Bank {
        Bank::new(ExtensionId::from_name("bank"), 4)
    }

    fn adapter() -> AdapterId {
        AdapterId::from_name("test-adapter")
    }

    fn holder(n: u8) -> Account {
        Account::Holder(Address::new(format!("moot_{:0>8}", n)))
    }

    fn eth() -> TokenAddress {
        TokenAddress::new("tok_eth")
    }

    #[test]
    fn access_is_fail_closed() {
        let mut bank = test_bank();
        let result = bank.add_to_balance(
            &DenyAll,
            adapter(),
            holder(1),
            Asset::Shares,
            TokenAmount::new(100),
        );
        match result.unwrap_err() {
            BankError::AccessDenied { capability, .. } => {
                assert_eq!(capability, Capability::AddBalance);
            }
            other => panic!("expected AccessDenied, got {other:?}"),
        }
        assert!(bank.balance_of(&holder(1), &Asset::Shares).is_zero());
    }

    #[test]
    fn credit_updates_account_and_supply() {
        let mut bank = test_bank();
        bank.add_to_balance(&AllowAll, adapter(), holder(1), Asset::Shares, TokenAmount::new(100))
            .unwrap();
        assert_eq!(bank.balance_of(&holder(1), &Asset::Shares), TokenAmount::new(100));
        assert_eq!(bank.balance_of(&Account::Total, &Asset::Shares), TokenAmount::new(100));
    }

    #[test]
    fn debit_updates_account_and_supply() {
        let mut bank = test_bank();
        bank.add_to_balance(&AllowAll, adapter(), holder(1), Asset::Loot, TokenAmount::new(100))
            .unwrap();
        bank.subtract_from_balance(&AllowAll, adapter(), holder(1), Asset::Loot, TokenAmount::new(30))
            .unwrap();
        assert_eq!(bank.balance_of(&holder(1), &Asset::Loot), TokenAmount::new(70));
        assert_eq!(bank.balance_of(&Account::Total, &Asset::Loot), TokenAmount::new(70));
    }

    #[test]
    fn debit_beyond_balance_fails_without_mutation() {
        let mut bank = test_bank();
        bank.add_to_balance(&AllowAll, adapter(), holder(1), Asset::Shares, TokenAmount::new(50))
            .unwrap();
        let result = bank.subtract_from_balance(
            &AllowAll,
            adapter(),
            holder(1),
            Asset::Shares,
            TokenAmount::new(51),
        );
        match result.unwrap_err() {
            BankError::InsufficientFunds { needed, available } => {
                assert_eq!(needed, 51);
                assert_eq!(available, 50);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }
        assert_eq!(bank.balance_of(&holder(1), &Asset::Shares), TokenAmount::new(50));
        assert_eq!(bank.balance_of(&Account::Total, &Asset::Shares), TokenAmount::new(50));
    }

    #[test]
    fn transfer_moves_balance_without_changing_supply() {
        let mut bank = test_bank();
        bank.add_to_balance(
            &AllowAll,
            adapter(),
            Account::Guild,
            Asset::Token(eth()),
            TokenAmount::new(1_000),
        )
        .unwrap();
        bank.internal_transfer(
            &AllowAll,
            adapter(),
            Account::Guild,
            holder(2),
            Asset::Token(eth()),
            TokenAmount::new(400),
        )
        .unwrap();
        assert_eq!(
            bank.balance_of(&Account::Guild, &Asset::Token(eth())),
            TokenAmount::new(600)
        );
        assert_eq!(bank.balance_of(&holder(2), &Asset::Token(eth())), TokenAmount::new(400));
        assert_eq!(
            bank.balance_of(&Account::Total, &Asset::Token(eth())),
            TokenAmount::new(1_000)
        );
    }

    #[test]
    fn guild_credit_bootstraps_unregistered_token() {
        let mut bank = test_bank();
        assert!(!bank.is_asset_allowed(&Asset::Token(eth())));
        let result = bank
            .add_to_balance(
                &AllowAll,
                adapter(),
                Account::Guild,
                Asset::Token(eth()),
                TokenAmount::new(10),
            )
            .unwrap();
        assert_eq!(result.newly_allowed, Some(eth()));
        assert!(bank.is_asset_allowed(&Asset::Token(eth())));
    }

    #[test]
    fn holder_credit_in_unregistered_token_is_rejected() {
        let mut bank = test_bank();
        let result = bank.add_to_balance(
            &AllowAll,
            adapter(),
            holder(1),
            Asset::Token(eth()),
            TokenAmount::new(10),
        );
        assert!(matches!(result.unwrap_err(), BankError::AssetNotAllowed(_)));
    }

    #[test]
    fn allow_list_is_bounded() {
        let mut bank = test_bank();
        for i in 0..4 {
            bank.register_token(&AllowAll, adapter(), TokenAddress::new(format!("tok_{i}")))
                .unwrap();
        }
        let result =
            bank.register_token(&AllowAll, adapter(), TokenAddress::new("tok_overflow"));
        match result.unwrap_err() {
            BankError::AllowListFull { max } => assert_eq!(max, 4),
            other => panic!("expected AllowListFull, got {other:?}"),
        }
    }

    #[test]
    fn register_token_is_idempotent() {
        let mut bank = test_bank();
        assert!(bank.register_token(&AllowAll, adapter(), eth()).unwrap());
        assert!(!bank.register_token(&AllowAll, adapter(), eth()).unwrap());
        assert_eq!(bank.allowed_token_count(), 1);
    }

    #[test]
    fn withdraw_debits_and_returns_receipt() {
        let mut bank = test_bank();
        bank.register_token(&AllowAll, adapter(), eth()).unwrap();
        bank.add_to_balance(
            &AllowAll,
            adapter(),
            holder(3),
            Asset::Token(eth()),
            TokenAmount::new(500),
        )
        .unwrap();

        let (receipt, _) = bank
            .withdraw(
                &AllowAll,
                adapter(),
                holder(3),
                Asset::Token(eth()),
                TokenAmount::new(500),
            )
            .unwrap();
        assert_eq!(receipt.amount, TokenAmount::new(500));
        assert!(bank.balance_of(&holder(3), &Asset::Token(eth())).is_zero());
        assert!(bank
            .balance_of(&Account::Total, &Asset::Token(eth()))
            .is_zero());
    }

    #[test]
    fn conservation_holds_after_mixed_operations() {
        let mut bank = test_bank();
        bank.add_to_balance(&AllowAll, adapter(), holder(1), Asset::Shares, TokenAmount::new(700))
            .unwrap();
        bank.add_to_balance(&AllowAll, adapter(), holder(2), Asset::Shares, TokenAmount::new(300))
            .unwrap();
        bank.internal_transfer(
            &AllowAll,
            adapter(),
            holder(1),
            holder(2),
            Asset::Shares,
            TokenAmount::new(150),
        )
        .unwrap();
        bank.subtract_from_balance(&AllowAll, adapter(), holder(2), Asset::Shares, TokenAmount::new(50))
            .unwrap();

        assert_eq!(
            bank.circulating_sum(&Asset::Shares),
            Some(bank.balance_of(&Account::Total, &Asset::Shares))
        );
    }
}
