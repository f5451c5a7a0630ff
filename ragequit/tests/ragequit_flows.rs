//! Proportional-withdrawal flows: full exits, truncation dust, and the
//! asset-list validation rules.

use moot_ragequit::{RagequitError, RagequitProcessor};
use moot_registry::{AdapterConfig, DaoConfig, DaoRegistry, GrantConfig, MemberStatus};
use moot_types::{Account, AdapterId, Address, Asset, Capability, TokenAddress, TokenAmount};

const GUILD_FUNDING: u128 = 1_200_000_000_000_000_000;
const MEMBER_SHARES: u128 = 10_000_000_000_000_000;

fn addr(name: &str) -> Address {
    Address::new(format!("moot_{name}"))
}

fn eth() -> TokenAddress {
    TokenAddress::new("tok_eth")
}

fn onboarding() -> AdapterId {
    AdapterId::from_name("onboarding")
}

fn grant(extension: &str, capabilities: &[Capability]) -> GrantConfig {
    GrantConfig {
        extension: extension.to_string(),
        capabilities: capabilities.to_vec(),
    }
}

fn test_config(ragequit_grants: Vec<GrantConfig>) -> DaoConfig {
    DaoConfig {
        voting_period_secs: 600,
        grace_period_secs: 600,
        max_external_tokens: 8,
        adapters: vec![
            AdapterConfig {
                name: "onboarding".to_string(),
                address: "moot_adapter_onboarding".to_string(),
                grants: vec![
                    grant("registry", &[Capability::NewMember]),
                    grant("bank", &[Capability::AddBalance]),
                ],
            },
            AdapterConfig {
                name: RagequitProcessor::ADAPTER_NAME.to_string(),
                address: "moot_adapter_ragequit".to_string(),
                grants: ragequit_grants,
            },
        ],
    }
}

fn ragequit_grants() -> Vec<GrantConfig> {
    vec![
        grant(
            "bank",
            &[Capability::SubtractBalance, Capability::InternalTransfer],
        ),
        grant("registry", &[Capability::JailMember]),
    ]
}

/// A DAO holding `GUILD_FUNDING` of eth, with the creator on one raw share
/// and `member` on `MEMBER_SHARES`.
fn funded_dao() -> (DaoRegistry, Address) {
    let mut dao = DaoRegistry::from_config(test_config(ragequit_grants())).unwrap();
    let member = addr("member");

    dao.new_member(onboarding(), &addr("creator")).unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Holder(addr("creator")),
        Asset::Shares,
        TokenAmount::new(1),
    )
    .unwrap();

    dao.new_member(onboarding(), &member).unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Holder(member.clone()),
        Asset::Shares,
        TokenAmount::new(MEMBER_SHARES),
    )
    .unwrap();

    dao.add_to_balance(
        onboarding(),
        Account::Guild,
        Asset::Token(eth()),
        TokenAmount::new(GUILD_FUNDING),
    )
    .unwrap();

    (dao, member)
}

#[test]
fn full_exit_leaves_truncation_dust_in_guild() {
    let (mut dao, member) = funded_dao();
    let processor = RagequitProcessor::new();

    let outcome = processor
        .ragequit(
            &mut dao,
            &member,
            TokenAmount::new(MEMBER_SHARES),
            TokenAmount::ZERO,
            &[eth()],
        )
        .unwrap();

    // Integer division truncates; the dust is expected and correct.
    assert_eq!(
        dao.balance_of(&Account::Guild, &Asset::Token(eth())),
        TokenAmount::new(120)
    );
    assert_eq!(
        dao.balance_of(&Account::Holder(member.clone()), &Asset::Token(eth())),
        TokenAmount::new(GUILD_FUNDING - 120)
    );
    assert!(dao
        .balance_of(&Account::Holder(member.clone()), &Asset::Shares)
        .is_zero());
    assert_eq!(
        dao.balance_of(&Account::Total, &Asset::Shares),
        TokenAmount::new(1)
    );

    // Full exit jails the identity; the record itself is retained.
    assert!(outcome.jailed);
    assert_eq!(dao.member(&member).unwrap().status, MemberStatus::Jailed);
}

#[test]
fn payout_is_proportional_with_truncation() {
    let mut dao = DaoRegistry::from_config(test_config(ragequit_grants())).unwrap();
    let member = addr("small_holder");

    dao.new_member(onboarding(), &addr("creator")).unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Holder(addr("creator")),
        Asset::Shares,
        TokenAmount::new(7),
    )
    .unwrap();
    dao.new_member(onboarding(), &member).unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Holder(member.clone()),
        Asset::Shares,
        TokenAmount::new(3),
    )
    .unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Guild,
        Asset::Token(eth()),
        TokenAmount::new(1_000),
    )
    .unwrap();

    let processor = RagequitProcessor::new();
    let outcome = processor
        .ragequit(
            &mut dao,
            &member,
            TokenAmount::new(3),
            TokenAmount::ZERO,
            &[eth()],
        )
        .unwrap();

    // G - floor(G * u / T) = 1000 - floor(1000 * 3 / 10).
    assert_eq!(outcome.payouts, vec![(eth(), TokenAmount::new(300))]);
    assert_eq!(
        dao.balance_of(&Account::Guild, &Asset::Token(eth())),
        TokenAmount::new(700)
    );
}

#[test]
fn loot_counts_toward_burn_units_without_voting_weight() {
    let mut dao = DaoRegistry::from_config(test_config(ragequit_grants())).unwrap();
    let member = addr("loot_holder");

    dao.new_member(onboarding(), &addr("creator")).unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Holder(addr("creator")),
        Asset::Shares,
        TokenAmount::new(5),
    )
    .unwrap();
    dao.new_member(onboarding(), &member).unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Holder(member.clone()),
        Asset::Loot,
        TokenAmount::new(5),
    )
    .unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Guild,
        Asset::Token(eth()),
        TokenAmount::new(100),
    )
    .unwrap();

    let processor = RagequitProcessor::new();
    let outcome = processor
        .ragequit(
            &mut dao,
            &member,
            TokenAmount::ZERO,
            TokenAmount::new(5),
            &[eth()],
        )
        .unwrap();

    // burn_units = 5, pre_burn_total = 5 shares + 5 loot.
    assert_eq!(outcome.payouts, vec![(eth(), TokenAmount::new(50))]);
    assert!(dao
        .balance_of(&Account::Holder(member), &Asset::Loot)
        .is_zero());
    assert_eq!(
        dao.balance_of(&Account::Total, &Asset::Loot),
        TokenAmount::ZERO
    );
}

#[test]
fn partial_exit_does_not_jail() {
    let (mut dao, member) = funded_dao();
    let processor = RagequitProcessor::new();

    processor
        .ragequit(
            &mut dao,
            &member,
            TokenAmount::new(MEMBER_SHARES / 2),
            TokenAmount::ZERO,
            &[eth()],
        )
        .unwrap();

    assert_eq!(dao.member(&member).unwrap().status, MemberStatus::Active);
    assert_eq!(
        dao.balance_of(&Account::Holder(member), &Asset::Shares),
        TokenAmount::new(MEMBER_SHARES / 2)
    );
}

#[test]
fn empty_asset_list_is_rejected() {
    let (mut dao, member) = funded_dao();
    let processor = RagequitProcessor::new();

    let result = processor.ragequit(
        &mut dao,
        &member,
        TokenAmount::new(1),
        TokenAmount::ZERO,
        &[],
    );
    assert!(matches!(result.unwrap_err(), RagequitError::MissingAssets));
}

#[test]
fn duplicate_asset_is_rejected() {
    let (mut dao, member) = funded_dao();
    let processor = RagequitProcessor::new();

    let result = processor.ragequit(
        &mut dao,
        &member,
        TokenAmount::new(1),
        TokenAmount::ZERO,
        &[eth(), eth()],
    );
    match result.unwrap_err() {
        RagequitError::DuplicateAsset(token) => assert_eq!(token, eth()),
        other => panic!("expected DuplicateAsset, got {other:?}"),
    }
    // Nothing moved.
    assert_eq!(
        dao.balance_of(&Account::Guild, &Asset::Token(eth())),
        TokenAmount::new(GUILD_FUNDING)
    );
}

#[test]
fn disallowed_asset_is_rejected() {
    let (mut dao, member) = funded_dao();
    let processor = RagequitProcessor::new();

    let unknown = TokenAddress::new("tok_unlisted");
    let result = processor.ragequit(
        &mut dao,
        &member,
        TokenAmount::new(1),
        TokenAmount::ZERO,
        &[unknown.clone()],
    );
    match result.unwrap_err() {
        RagequitError::AssetNotAllowed(token) => assert_eq!(token, unknown),
        other => panic!("expected AssetNotAllowed, got {other:?}"),
    }
}

#[test]
fn burning_more_than_held_is_rejected() {
    let (mut dao, member) = funded_dao();
    let processor = RagequitProcessor::new();

    let result = processor.ragequit(
        &mut dao,
        &member,
        TokenAmount::new(MEMBER_SHARES + 1),
        TokenAmount::ZERO,
        &[eth()],
    );
    match result.unwrap_err() {
        RagequitError::InsufficientShares { needed, available } => {
            assert_eq!(needed, MEMBER_SHARES + 1);
            assert_eq!(available, MEMBER_SHARES);
        }
        other => panic!("expected InsufficientShares, got {other:?}"),
    }
}

#[test]
fn non_member_has_no_stake_to_burn() {
    let (mut dao, _) = funded_dao();
    let processor = RagequitProcessor::new();

    let outsider = addr("outsider");
    let result = processor.ragequit(
        &mut dao,
        &outsider,
        TokenAmount::new(1),
        TokenAmount::ZERO,
        &[eth()],
    );
    assert!(matches!(
        result.unwrap_err(),
        RagequitError::InsufficientShares { .. }
    ));
}

#[test]
fn missing_wiring_fails_before_any_mutation() {
    // Ragequit registered without its bank grants.
    let mut dao = DaoRegistry::from_config(test_config(vec![grant(
        "registry",
        &[Capability::JailMember],
    )]))
    .unwrap();
    let member = addr("member");
    dao.new_member(onboarding(), &member).unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Holder(member.clone()),
        Asset::Shares,
        TokenAmount::new(10),
    )
    .unwrap();
    dao.add_to_balance(
        onboarding(),
        Account::Guild,
        Asset::Token(eth()),
        TokenAmount::new(100),
    )
    .unwrap();

    let processor = RagequitProcessor::new();
    let result = processor.ragequit(
        &mut dao,
        &member,
        TokenAmount::new(10),
        TokenAmount::ZERO,
        &[eth()],
    );
    assert!(matches!(
        result.unwrap_err(),
        RagequitError::MissingCapability(_)
    ));
    // The pre-flight ran before the apply phase: nothing moved.
    assert_eq!(
        dao.balance_of(&Account::Guild, &Asset::Token(eth())),
        TokenAmount::new(100)
    );
    assert_eq!(
        dao.balance_of(&Account::Holder(member), &Asset::Shares),
        TokenAmount::new(10)
    );
}

#[test]
fn conservation_holds_after_ragequit() {
    let (mut dao, member) = funded_dao();
    let processor = RagequitProcessor::new();

    processor
        .ragequit(
            &mut dao,
            &member,
            TokenAmount::new(MEMBER_SHARES),
            TokenAmount::ZERO,
            &[eth()],
        )
        .unwrap();

    // Guild + member holdings must equal the eth supply.
    let guild = dao.balance_of(&Account::Guild, &Asset::Token(eth()));
    let held = dao.balance_of(&Account::Holder(member), &Asset::Token(eth()));
    let total = dao.balance_of(&Account::Total, &Asset::Token(eth()));
    assert_eq!(guild.checked_add(held), Some(total));
}
