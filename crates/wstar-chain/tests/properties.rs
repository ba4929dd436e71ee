// crates/wstar-chain/tests/properties.rs
//
// Property tests over arbitrary deposit/redeem sequences.

use proptest::prelude::*;

use wstar_chain::{Chain, ChainConfig};
use wstar_core::{Address, Point, PointSize, WstarError};
use wstar_treasury::ONE_STAR;

const GALAXY_ZERO: Point = Point::new(0x0);

fn creator() -> Address {
    Address::from_label("creator")
}

/// Galaxy zero owned and linked by creator, treasury as its spawn proxy.
fn chain() -> Chain {
    let mut chain = Chain::new(ChainConfig {
        deployer: creator(),
        ..ChainConfig::default()
    });
    let treasury = chain.deployment().treasury;
    chain
        .create_galaxy(creator(), GALAXY_ZERO, creator())
        .unwrap();
    chain
        .configure_keys(creator(), GALAXY_ZERO, [1; 32], [2; 32], 1, false)
        .unwrap();
    chain
        .set_spawn_proxy(creator(), GALAXY_ZERO, treasury)
        .unwrap();
    chain
}

/// The `n`th star under galaxy zero (n in 1..=255).
fn star(n: u32) -> Point {
    Point::new(n << 8)
}

#[derive(Debug, Clone)]
enum Op {
    Deposit,
    Redeem,
}

prop_compose! {
    fn arb_ops()(
        ops in prop::collection::vec(any::<bool>(), 0..40),
    ) -> Vec<Op> {
        ops.into_iter()
            .map(|deposit| if deposit { Op::Deposit } else { Op::Redeem })
            .collect()
    }
}

prop_compose! {
    fn arb_non_star()(
        galaxy in 0u32..0x100,
        planet in 0x1_0000u32..=u32::MAX,
        pick_galaxy in any::<bool>(),
    ) -> Point {
        if pick_galaxy { Point::new(galaxy) } else { Point::new(planet) }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_redeem_reverses_deposits(n in 1u32..20) {
        let mut chain = chain();
        for i in 1..=n {
            chain.deposit(creator(), star(i)).unwrap();
        }
        for i in (1..=n).rev() {
            prop_assert_eq!(chain.redeem(creator()).unwrap().value, star(i));
        }
        prop_assert_eq!(chain.asset_count().unwrap(), 0);
        prop_assert_eq!(chain.token().total_supply(), 0);
    }

    #[test]
    fn test_assets_track_supply(ops in arb_ops()) {
        let mut chain = chain();
        let mut model: Vec<Point> = Vec::new();
        let mut next = 1u32;

        for op in ops {
            match op {
                Op::Deposit => {
                    chain.deposit(creator(), star(next)).unwrap();
                    model.push(star(next));
                    next += 1;
                }
                Op::Redeem => {
                    let before = chain.events().len();
                    match chain.redeem(creator()) {
                        Ok(receipt) => {
                            prop_assert_eq!(Some(receipt.value), model.pop());
                        }
                        Err(e) => {
                            prop_assert_eq!(e, WstarError::NoAssets);
                            prop_assert!(model.is_empty());
                            prop_assert_eq!(chain.events().len(), before);
                        }
                    }
                }
            }
            let supply = chain.token().total_supply();
            prop_assert_eq!(supply % ONE_STAR, 0);
            prop_assert_eq!(chain.asset_count().unwrap() as u128, supply / ONE_STAR);
            prop_assert_eq!(chain.all_assets().unwrap(), model.clone());
        }
    }

    #[test]
    fn test_non_stars_rejected(point in arb_non_star()) {
        let mut chain = chain();
        chain.deposit(creator(), star(1)).unwrap();
        let events = chain.events().len();

        let result = chain.deposit(creator(), point);
        prop_assert!(matches!(result, Err(WstarError::InvalidAssetClass(p, size)) if p == point && size != PointSize::Star));
        prop_assert_eq!(chain.asset_count().unwrap(), 1);
        prop_assert_eq!(chain.token().total_supply(), ONE_STAR);
        prop_assert_eq!(chain.events().len(), events);
    }

    #[test]
    fn test_strangers_cannot_deposit(label in "[a-z]{3,12}", n in 1u32..256) {
        prop_assume!(label != "creator");
        let stranger = Address::from_label(&label);
        let mut chain = chain();
        let result = chain.deposit(stranger, star(n));
        prop_assert!(matches!(result, Err(WstarError::Unauthorized(_))));
        prop_assert_eq!(chain.asset_count().unwrap(), 0);
        prop_assert!(!chain.azimuth().is_active(star(n)));
    }
}
