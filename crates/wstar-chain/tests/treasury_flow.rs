// crates/wstar-chain/tests/treasury_flow.rs
//
// End-to-end treasury lifecycle against a freshly deployed chain: custody
// setup through the Ecliptic, deposits of spawned and unspawned stars,
// LIFO redemption, token hand-off, balance checks, the inbound-transfer
// guard, and proxy administration.

use wstar_chain::{Chain, ChainConfig};
use wstar_core::{Address, Event, Point, PointSize, WstarError};
use wstar_treasury::ONE_STAR;

const GALAXY_ZERO: Point = Point::new(0x0);
const STAR_ZERO: Point = Point::new(0x100);
const STAR_ONE: Point = Point::new(0x200);
const STAR_TWO: Point = Point::new(0x300);
const PLANET_ZERO: Point = Point::new(0x10100);

struct Actors {
    creator: Address,
    operator: Address,
    mallory: Address,
}

fn actors() -> Actors {
    Actors {
        creator: Address::from_label("creator"),
        operator: Address::from_label("operator"),
        mallory: Address::from_label("mallory"),
    }
}

/// Creator deploys and owns galaxy zero (linked), has spawned star zero,
/// and has made the treasury spawn proxy of the galaxy and transfer proxy
/// of star zero.
fn setup() -> (Chain, Actors) {
    let a = actors();
    let mut chain = Chain::new(ChainConfig {
        deployer: a.creator,
        ..ChainConfig::default()
    });
    let d = chain.deployment();

    assert!(chain.azimuth().is_owner(GALAXY_ZERO, Address::ZERO));
    let receipt = chain
        .create_galaxy(a.creator, GALAXY_ZERO, a.creator)
        .unwrap();
    assert!(receipt.events.iter().any(|e| e.emitter == d.ecliptic
        && e.event
            == Event::PointTransfer {
                from: Address::ZERO,
                to: a.creator,
                point: GALAXY_ZERO
            }));
    assert!(chain.azimuth().is_active(GALAXY_ZERO));
    assert_eq!(chain.azimuth().get_spawn_count(GALAXY_ZERO), 0);

    let receipt = chain
        .configure_keys(a.creator, GALAXY_ZERO, [1; 32], [2; 32], 1, false)
        .unwrap();
    assert!(receipt
        .events
        .iter()
        .any(|e| e.emitter == d.azimuth && e.event.name() == "ChangedKeys"));

    let prefix = chain.azimuth().get_prefix(STAR_ZERO);
    assert_eq!(prefix, GALAXY_ZERO);
    assert_eq!(chain.azimuth().get_point_size(prefix), PointSize::Galaxy);
    assert!(chain.azimuth().has_been_linked(prefix));
    assert!(chain.azimuth().can_spawn_as(prefix, a.creator));
    chain.spawn(a.creator, STAR_ZERO, a.creator).unwrap();
    assert_eq!(chain.azimuth().get_spawn_count(prefix), 1);

    let receipt = chain
        .set_spawn_proxy(a.creator, GALAXY_ZERO, d.treasury)
        .unwrap();
    assert!(receipt.events.iter().any(|e| e.emitter == d.azimuth
        && e.event
            == Event::ChangedSpawnProxy {
                point: GALAXY_ZERO,
                spawn_proxy: d.treasury
            }));

    let receipt = chain
        .set_transfer_proxy(a.creator, STAR_ZERO, d.treasury)
        .unwrap();
    assert!(receipt.events.iter().any(|e| e.emitter == d.ecliptic
        && e.event
            == Event::PointApproval {
                owner: a.creator,
                approved: d.treasury,
                point: STAR_ZERO
            }));

    assert!(chain.azimuth().is_transfer_proxy(STAR_ZERO, d.treasury));
    assert!(!chain.azimuth().has_been_linked(STAR_ZERO));
    assert!(!chain.azimuth().is_active(STAR_ONE));
    assert!(chain.azimuth().is_spawn_proxy(GALAXY_ZERO, d.treasury));

    (chain, a)
}

fn deposit_both(chain: &mut Chain, a: &Actors) {
    chain.deposit(a.creator, STAR_ZERO).unwrap();
    chain.deposit(a.creator, STAR_ONE).unwrap();
}

#[test]
fn test_fresh_treasury() {
    let (chain, _) = setup();
    assert_eq!(chain.asset_count().unwrap(), 0);
    assert_eq!(
        chain.treasury().storage().azimuth,
        chain.deployment().azimuth
    );
    assert_eq!(chain.token().name(), "WrappedStar");
    assert_eq!(chain.token().symbol(), "WSTR");
    assert_eq!(chain.token().total_supply(), 0);
}

#[test]
fn test_deposit_from_owner() {
    let (mut chain, a) = setup();
    let d = chain.deployment();

    // Spawned star: transferred in
    let receipt = chain.deposit(a.creator, STAR_ZERO).unwrap();
    assert!(receipt.events.iter().any(|e| e.emitter == d.treasury
        && e.event
            == Event::Deposit {
                prefix: GALAXY_ZERO,
                point: STAR_ZERO,
                depositor: a.creator
            }));
    assert!(receipt.events.iter().any(|e| e.emitter == d.token
        && e.event
            == Event::Transfer {
                from: Address::ZERO,
                to: a.creator,
                value: ONE_STAR
            }));
    assert_eq!(chain.token().balance_of(a.creator), ONE_STAR);
    assert!(chain.azimuth().is_owner(STAR_ZERO, d.treasury));
    assert_eq!(chain.asset_count().unwrap(), 1);

    // Unspawned star: spawned straight into the treasury
    let receipt = chain.deposit(a.creator, STAR_ONE).unwrap();
    assert!(receipt.events.iter().any(|e| e.emitter == d.treasury
        && e.event
            == Event::Deposit {
                prefix: GALAXY_ZERO,
                point: STAR_ONE,
                depositor: a.creator
            }));
    assert_eq!(chain.token().balance_of(a.creator), 2 * ONE_STAR);
    assert!(chain.azimuth().is_owner(STAR_ONE, d.treasury));
    assert_eq!(chain.asset_count().unwrap(), 2);

    // Oldest first
    assert_eq!(chain.all_assets().unwrap(), vec![STAR_ZERO, STAR_ONE]);
}

#[test]
fn test_rejects_non_stars() {
    let (mut chain, a) = setup();
    deposit_both(&mut chain, &a);
    assert!(matches!(
        chain.deposit(a.creator, GALAXY_ZERO),
        Err(WstarError::InvalidAssetClass(_, PointSize::Galaxy))
    ));
    assert!(matches!(
        chain.deposit(a.creator, PLANET_ZERO),
        Err(WstarError::InvalidAssetClass(_, PointSize::Planet))
    ));
    assert_eq!(chain.asset_count().unwrap(), 2);
    assert_eq!(chain.token().total_supply(), 2 * ONE_STAR);
}

#[test]
fn test_rejects_non_owner() {
    let (mut chain, a) = setup();
    assert!(matches!(
        chain.deposit(a.mallory, STAR_ZERO),
        Err(WstarError::Unauthorized(_))
    ));
    assert!(matches!(
        chain.deposit(a.mallory, STAR_ONE),
        Err(WstarError::Unauthorized(_))
    ));

    deposit_both(&mut chain, &a);
    // Escrowed stars belong to the treasury now
    assert!(matches!(
        chain.deposit(a.mallory, STAR_ZERO),
        Err(WstarError::Unauthorized(_))
    ));
    assert_eq!(chain.asset_count().unwrap(), 2);
}

#[test]
fn test_redeem_is_lifo() {
    let (mut chain, a) = setup();
    let d = chain.deployment();
    deposit_both(&mut chain, &a);

    assert_eq!(chain.redeem_preview(a.creator).unwrap(), STAR_ONE);
    let receipt = chain.redeem(a.creator).unwrap();
    assert_eq!(receipt.value, STAR_ONE);
    assert!(receipt.events.iter().any(|e| e.emitter == d.treasury
        && e.event
            == Event::Redeem {
                prefix: GALAXY_ZERO,
                point: STAR_ONE,
                redeemer: a.creator
            }));
    assert!(chain.azimuth().is_owner(STAR_ONE, a.creator));

    assert_eq!(chain.redeem_preview(a.creator).unwrap(), STAR_ZERO);
    let receipt = chain.redeem(a.creator).unwrap();
    assert_eq!(receipt.value, STAR_ZERO);
    assert_eq!(chain.asset_count().unwrap(), 0);
    assert_eq!(chain.token().balance_of(a.creator), 0);
    assert_eq!(chain.token().total_supply(), 0);
}

#[test]
fn test_deposit_send_redeem() {
    let (mut chain, a) = setup();
    let d = chain.deployment();
    deposit_both(&mut chain, &a);
    chain.redeem(a.creator).unwrap();
    chain.redeem(a.creator).unwrap();

    // Redemption cleared the transfer proxy; grant it again
    assert_eq!(chain.azimuth().get_transfer_proxy(STAR_ZERO), Address::ZERO);
    chain
        .set_transfer_proxy(a.creator, STAR_ZERO, d.treasury)
        .unwrap();
    chain.deposit(a.creator, STAR_ZERO).unwrap();
    assert_eq!(chain.token().balance_of(a.creator), ONE_STAR);

    let receipt = chain
        .token_transfer(a.creator, a.operator, ONE_STAR)
        .unwrap();
    assert!(receipt.events.iter().any(|e| e.event
        == Event::Transfer {
            from: a.creator,
            to: a.operator,
            value: ONE_STAR
        }));
    assert_eq!(chain.token().balance_of(a.creator), 0);
    assert_eq!(chain.token().balance_of(a.operator), ONE_STAR);

    let receipt = chain.redeem(a.operator).unwrap();
    assert_eq!(receipt.value, STAR_ZERO);
    assert!(chain.azimuth().is_owner(STAR_ZERO, a.operator));
    assert_eq!(chain.token().balance_of(a.operator), 0);
    assert_eq!(chain.asset_count().unwrap(), 0);
}

#[test]
fn test_redeem_requires_balance() {
    let (mut chain, a) = setup();
    let d = chain.deployment();

    assert_eq!(chain.redeem(a.mallory).err(), Some(WstarError::NoAssets));

    chain.deposit(a.creator, STAR_ZERO).unwrap();
    assert!(matches!(
        chain.redeem(a.mallory),
        Err(WstarError::InsufficientBalance { .. })
    ));

    chain.token_transfer(a.creator, a.mallory, 1).unwrap();
    assert_eq!(chain.token().balance_of(a.mallory), 1);
    assert_eq!(
        chain.redeem(a.creator).err(),
        Some(WstarError::InsufficientBalance {
            required: ONE_STAR,
            available: ONE_STAR - 1
        })
    );
    assert!(chain.azimuth().is_owner(STAR_ZERO, d.treasury));
    assert_eq!(chain.asset_count().unwrap(), 1);
}

#[test]
fn test_operator_deposit() {
    let (mut chain, a) = setup();
    chain
        .set_approval_for_all(a.creator, a.operator, true)
        .unwrap();
    chain.deposit(a.operator, STAR_ONE).unwrap();
    assert_eq!(chain.token().balance_of(a.operator), ONE_STAR);
    assert!(chain
        .azimuth()
        .is_owner(STAR_ONE, chain.deployment().treasury));
}

#[test]
fn test_inbound_safe_transfer_rejected() {
    let (mut chain, a) = setup();
    let d = chain.deployment();
    assert!(!chain.azimuth().is_active(STAR_TWO));
    chain.spawn(a.creator, STAR_TWO, a.creator).unwrap();
    assert!(chain.azimuth().can_transfer(STAR_TWO, a.creator));
    assert_eq!(chain.azimuth().get_transfer_proxy(STAR_TWO), Address::ZERO);

    assert_eq!(
        chain
            .safe_transfer_from(a.creator, a.creator, d.treasury, STAR_TWO)
            .err(),
        Some(WstarError::UnsafeTransferRejected(STAR_TWO))
    );
    assert!(chain.azimuth().is_owner(STAR_TWO, a.creator));

    // An unsafe transfer cannot be refused, and credits nothing
    chain
        .transfer_from(a.creator, a.creator, d.treasury, STAR_TWO)
        .unwrap();
    assert!(chain.azimuth().is_owner(STAR_TWO, d.treasury));
    assert_eq!(chain.token().total_supply(), 0);
    assert_eq!(chain.asset_count().unwrap(), 0);
}

#[test]
fn test_proxy_admin_rules() {
    let (mut chain, a) = setup();
    let d = chain.deployment();
    let v2 = chain.deploy_implementation(a.creator);

    // Only the Ecliptic may touch the proxy directly
    assert!(matches!(
        chain.proxy_upgrade_to(a.creator, v2),
        Err(WstarError::Unauthorized(_))
    ));
    // Only the Ecliptic owner may drive it through the Ecliptic
    assert!(matches!(
        chain.upgrade_treasury(a.mallory, v2),
        Err(WstarError::Unauthorized(_))
    ));

    chain.upgrade_treasury(a.creator, v2).unwrap();
    assert_eq!(chain.treasury().implementation(), v2);

    let receipt = chain.freeze_treasury(a.creator).unwrap();
    assert!(receipt.events.iter().any(|e| e.emitter == d.treasury
        && e.event == Event::Frozen { implementation: v2 }));

    let v3 = chain.deploy_implementation(a.creator);
    assert_eq!(
        chain.upgrade_treasury(a.creator, v3).err(),
        Some(WstarError::ContractFrozen(d.treasury))
    );
    assert!(matches!(
        chain.proxy_upgrade_to(a.mallory, v3),
        Err(WstarError::Unauthorized(_))
    ));
    assert!(matches!(
        chain.proxy_freeze(a.mallory),
        Err(WstarError::Unauthorized(_))
    ));

    // Repeat freeze is accepted and silent
    let receipt = chain.freeze_treasury(a.creator).unwrap();
    assert!(receipt.events.is_empty());

    // Storage survives upgrades; the treasury keeps working when frozen
    chain.deposit(a.creator, STAR_ZERO).unwrap();
    assert_eq!(chain.redeem(a.creator).unwrap().value, STAR_ZERO);
}

#[test]
fn test_contracts_cannot_send_transactions() {
    let (mut chain, a) = setup();
    let d = chain.deployment();
    let v2 = chain.deploy_implementation(a.creator);

    // The Ecliptic only reaches the proxy through `upgrade_treasury`
    assert!(matches!(
        chain.proxy_upgrade_to(d.ecliptic, v2),
        Err(WstarError::Unauthorized(_))
    ));
    assert!(matches!(
        chain.proxy_freeze(d.ecliptic),
        Err(WstarError::Unauthorized(_))
    ));
    assert_ne!(chain.treasury().implementation(), v2);
    assert!(!chain.treasury().is_frozen());

    // A star sent to the treasury outside `deposit` stays uncredited
    chain.spawn(a.creator, STAR_TWO, a.creator).unwrap();
    chain
        .transfer_from(a.creator, a.creator, d.treasury, STAR_TWO)
        .unwrap();
    let events = chain.events().len();
    assert!(matches!(
        chain.deposit(d.treasury, STAR_TWO),
        Err(WstarError::Unauthorized(_))
    ));
    assert!(matches!(
        chain.token_transfer(d.token, a.creator, 0),
        Err(WstarError::Unauthorized(_))
    ));
    assert_eq!(chain.asset_count().unwrap(), 0);
    assert_eq!(chain.token().balance_of(d.treasury), 0);
    assert_eq!(chain.events().len(), events);
}

#[test]
fn test_wrapped_tokens_move_by_allowance_and_send() {
    let (mut chain, a) = setup();
    deposit_both(&mut chain, &a);
    let half = ONE_STAR / 2;

    let receipt = chain.token_approve(a.creator, a.operator, ONE_STAR).unwrap();
    assert!(receipt.events.iter().any(|e| e.event
        == Event::Approval {
            owner: a.creator,
            spender: a.operator,
            value: ONE_STAR
        }));

    chain
        .token_transfer_from(a.operator, a.creator, a.mallory, half)
        .unwrap();
    assert_eq!(chain.token().allowance(a.creator, a.operator), ONE_STAR - half);
    assert_eq!(chain.token().balance_of(a.mallory), half);

    assert_eq!(
        chain
            .token_transfer_from(a.operator, a.creator, a.operator, ONE_STAR)
            .err(),
        Some(WstarError::InsufficientAllowance {
            required: ONE_STAR,
            available: ONE_STAR - half
        })
    );
    assert_eq!(chain.token().balance_of(a.operator), 0);

    // The wrapped-star token reports sends as plain transfers
    let receipt = chain.token_send(a.creator, a.operator, half).unwrap();
    let names: Vec<&str> = receipt.events.iter().map(|e| e.event.name()).collect();
    assert_eq!(names, vec!["Transfer"]);
    assert_eq!(chain.token().balance_of(a.operator), half);

    chain.authorize_operator(a.creator, a.mallory).unwrap();
    chain
        .operator_send(a.mallory, a.creator, a.mallory, half)
        .unwrap();
    assert_eq!(chain.token().balance_of(a.mallory), ONE_STAR);
    assert_eq!(chain.token().balance_of(a.creator), 2 * ONE_STAR - 3 * half);
}
