// crates/wstar-chain/tests/scenario_file.rs
//
// Runs the walkthrough scenario shipped in `scenarios/` against a fresh chain.

use wstar_chain::{Chain, ChainConfig, Scenario};
use wstar_core::{Address, Point};

const WALKTHROUGH: &str = include_str!("../../../scenarios/treasury.toml");

#[test]
fn test_walkthrough_scenario_passes() {
    let scenario = Scenario::parse(WALKTHROUGH).unwrap();
    let mut chain = Chain::new(ChainConfig::default());
    let report = scenario.run(&mut chain).unwrap();

    assert!(
        report.passed(),
        "{:?}",
        report.failures().collect::<Vec<_>>()
    );
    assert_eq!(report.steps.len(), scenario.steps.len());
}

#[test]
fn test_walkthrough_final_state() {
    let scenario = Scenario::parse(WALKTHROUGH).unwrap();
    let mut chain = Chain::new(ChainConfig::default());
    scenario.run(&mut chain).unwrap();

    let treasury = chain.deployment().treasury;
    let bob = Address::from_label("bob");
    assert_eq!(chain.all_assets().unwrap(), vec![Point::new(0x100)]);
    assert_eq!(chain.azimuth().get_owner(Point::new(0x100)), treasury);
    assert_eq!(chain.azimuth().get_owner(Point::new(0x200)), bob);
    assert!(chain.treasury().is_frozen());
    // Supply still backs every escrowed star
    assert_eq!(
        chain.token().total_supply(),
        wstar_treasury::ONE_STAR * chain.asset_count().unwrap() as u128
    );
}
