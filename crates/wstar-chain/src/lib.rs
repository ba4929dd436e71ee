// crates/wstar-chain/src/lib.rs
//
// wstar-chain: The world the treasury runs in.
//
// Modules:
//   - chain: Deployment, atomic transactions, static calls, proxy delegation
//   - scenario: TOML-scripted call sequences with expected failures
//   - store: JSON snapshot persistence

pub mod chain;
pub mod scenario;
pub mod store;

pub use chain::{Chain, ChainConfig, Deployment, Receipt, WorldState};
pub use scenario::{Action, Scenario, ScenarioReport, Step, StepOutcome};
pub use store::{load_chain, save_chain, JsonFileStore};
