// crates/wstar-chain/src/scenario.rs
//
// Scripted scenarios: an ordered list of chain calls, each optionally
// expected to fail with a given error kind.
//
// Format (TOML):
//
//   name = "deposit and redeem"
//
//   [[step]]
//   as = "deployer"
//   action = "create_galaxy"
//   galaxy = "0x0"
//   target = "creator"
//
//   [[step]]
//   as = "mallory"
//   action = "deposit"
//   point = "0x100"
//   expect_error = "unauthorized"
//
// Points accept decimal or 0x hex. Amounts are decimal token amounts
// ("1", "0.5"). Actors are resolved with `Chain::resolve`.

use serde::{Deserialize, Serialize};

use wstar_core::crypto::parse_key;
use wstar_core::{Address, Point, WstarError};
use wstar_treasury::{parse_amount, Stars};

use crate::chain::Chain;

/// A parsed scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One call in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Actor performing the call.
    #[serde(rename = "as", default = "default_actor")]
    pub actor: String,
    #[serde(flatten)]
    pub action: Action,
    /// Error kind (`WstarError::kind`) the call must fail with.
    #[serde(default)]
    pub expect_error: Option<String>,
}

fn default_actor() -> String {
    "deployer".to_string()
}

fn default_true() -> bool {
    true
}

fn default_suite() -> u32 {
    1
}

/// The chain call of a step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    CreateGalaxy {
        galaxy: String,
        target: String,
    },
    ConfigureKeys {
        point: String,
        /// Hex key material; short keys are left-padded.
        encryption_key: String,
        authentication_key: String,
        #[serde(default = "default_suite")]
        crypto_suite_version: u32,
        #[serde(default)]
        discontinuous: bool,
    },
    Spawn {
        point: String,
        target: String,
    },
    SetSpawnProxy {
        prefix: String,
        proxy: String,
    },
    SetTransferProxy {
        point: String,
        proxy: String,
    },
    SetApprovalForAll {
        operator: String,
        #[serde(default = "default_true")]
        approved: bool,
    },
    TransferPoint {
        point: String,
        target: String,
        #[serde(default)]
        reset: bool,
    },
    SafeTransferPoint {
        point: String,
        from: String,
        to: String,
    },
    UnsafeTransferPoint {
        point: String,
        from: String,
        to: String,
    },
    Deposit {
        point: String,
    },
    Redeem {
        /// Star the redeem must return.
        #[serde(default)]
        expect: Option<String>,
    },
    TokenTransfer {
        to: String,
        amount: String,
    },
    TokenApprove {
        spender: String,
        amount: String,
    },
    TokenTransferFrom {
        from: String,
        to: String,
        amount: String,
    },
    TokenSend {
        to: String,
        amount: String,
    },
    AuthorizeOperator {
        operator: String,
    },
    RevokeOperator {
        operator: String,
    },
    OperatorSend {
        holder: String,
        to: String,
        amount: String,
    },
    OperatorBurn {
        holder: String,
        amount: String,
    },
    AssertAllowance {
        owner: String,
        spender: String,
        amount: String,
    },
    DeployImplementation,
    UpgradeTreasury {
        /// Implementation address, or "latest" for the most recent deployment.
        implementation: String,
    },
    FreezeTreasury,
    AssertOwner {
        point: String,
        owner: String,
    },
    AssertBalance {
        holder: String,
        amount: String,
    },
    AssertAssetCount {
        count: usize,
    },
}

impl Action {
    /// Short name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateGalaxy { .. } => "create_galaxy",
            Action::ConfigureKeys { .. } => "configure_keys",
            Action::Spawn { .. } => "spawn",
            Action::SetSpawnProxy { .. } => "set_spawn_proxy",
            Action::SetTransferProxy { .. } => "set_transfer_proxy",
            Action::SetApprovalForAll { .. } => "set_approval_for_all",
            Action::TransferPoint { .. } => "transfer_point",
            Action::SafeTransferPoint { .. } => "safe_transfer_point",
            Action::UnsafeTransferPoint { .. } => "unsafe_transfer_point",
            Action::Deposit { .. } => "deposit",
            Action::Redeem { .. } => "redeem",
            Action::TokenTransfer { .. } => "token_transfer",
            Action::TokenApprove { .. } => "token_approve",
            Action::TokenTransferFrom { .. } => "token_transfer_from",
            Action::TokenSend { .. } => "token_send",
            Action::AuthorizeOperator { .. } => "authorize_operator",
            Action::RevokeOperator { .. } => "revoke_operator",
            Action::OperatorSend { .. } => "operator_send",
            Action::OperatorBurn { .. } => "operator_burn",
            Action::AssertAllowance { .. } => "assert_allowance",
            Action::DeployImplementation => "deploy_implementation",
            Action::UpgradeTreasury { .. } => "upgrade_treasury",
            Action::FreezeTreasury => "freeze_treasury",
            Action::AssertOwner { .. } => "assert_owner",
            Action::AssertBalance { .. } => "assert_balance",
            Action::AssertAssetCount { .. } => "assert_asset_count",
        }
    }
}

/// What happened at one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub actor: String,
    pub action: String,
    /// `"ok"`, the error kind, or `"mismatch"` when an expectation on a
    /// successful call or on the state did not hold.
    pub result: String,
    /// Free-form detail: the error message or the returned value.
    pub detail: String,
    pub passed: bool,
}

/// Outcome of a whole scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<StepOutcome>,
}

impl ScenarioReport {
    /// Whether every step matched its expectation.
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.passed)
    }
}

impl Scenario {
    /// Parse a scenario from TOML.
    pub fn parse(input: &str) -> Result<Self, WstarError> {
        Ok(toml::from_str(input)?)
    }

    /// Run every step against `chain`, stopping at the first mismatch.
    ///
    /// Only malformed steps (bad point, address or amount) are returned as
    /// errors; call failures are recorded in the report.
    pub fn run(&self, chain: &mut Chain) -> Result<ScenarioReport, WstarError> {
        let mut report = ScenarioReport {
            name: self.name.clone(),
            steps: Vec::new(),
        };
        let mut latest_impl = None;

        for (index, step) in self.steps.iter().enumerate() {
            let (kind, detail, passed) = match execute(chain, step, &mut latest_impl)? {
                Executed::Call(Ok(detail)) => {
                    ("ok".to_string(), detail, step.expect_error.is_none())
                }
                Executed::Call(Err(e)) => {
                    let passed = step.expect_error.as_deref() == Some(e.kind());
                    (e.kind().to_string(), e.to_string(), passed)
                }
                // Not an error kind, so no `expect_error` can accept it
                Executed::Mismatch(detail) => (MISMATCH.to_string(), detail, false),
            };

            tracing::debug!(
                "Scenario step {} ({} as {}): {}",
                index,
                step.action.name(),
                step.actor,
                kind
            );
            report.steps.push(StepOutcome {
                index,
                actor: step.actor.clone(),
                action: step.action.name().to_string(),
                result: kind,
                detail,
                passed,
            });
            if !passed {
                tracing::warn!("Scenario {:?} failed at step {}", self.name, index);
                break;
            }
        }
        Ok(report)
    }
}

/// Result kind of a step whose expectation did not hold.
pub const MISMATCH: &str = "mismatch";

/// What a well-formed step did.
enum Executed {
    /// The chain call ran; its result (with a short description on success).
    Call(Result<String, WstarError>),
    /// An expectation failed. Nothing was committed by this step.
    Mismatch(String),
}

fn parse_point(input: &str) -> Result<Point, WstarError> {
    input.parse()
}

/// Execute one step. The error is a malformed step.
fn execute(
    chain: &mut Chain,
    step: &Step,
    latest_impl: &mut Option<Address>,
) -> Result<Executed, WstarError> {
    let caller = chain.resolve(&step.actor)?;
    let outcome = match &step.action {
        Action::CreateGalaxy { galaxy, target } => {
            let galaxy = parse_point(galaxy)?;
            let target = chain.resolve(target)?;
            chain.create_galaxy(caller, galaxy, target).map(|_| String::new())
        }
        Action::ConfigureKeys {
            point,
            encryption_key,
            authentication_key,
            crypto_suite_version,
            discontinuous,
        } => {
            let point = parse_point(point)?;
            let enc = parse_key(encryption_key)?;
            let auth = parse_key(authentication_key)?;
            chain
                .configure_keys(caller, point, enc, auth, *crypto_suite_version, *discontinuous)
                .map(|_| String::new())
        }
        Action::Spawn { point, target } => {
            let point = parse_point(point)?;
            let target = chain.resolve(target)?;
            chain.spawn(caller, point, target).map(|_| String::new())
        }
        Action::SetSpawnProxy { prefix, proxy } => {
            let prefix = parse_point(prefix)?;
            let proxy = chain.resolve(proxy)?;
            chain
                .set_spawn_proxy(caller, prefix, proxy)
                .map(|_| String::new())
        }
        Action::SetTransferProxy { point, proxy } => {
            let point = parse_point(point)?;
            let proxy = chain.resolve(proxy)?;
            chain
                .set_transfer_proxy(caller, point, proxy)
                .map(|_| String::new())
        }
        Action::SetApprovalForAll { operator, approved } => {
            let operator = chain.resolve(operator)?;
            chain
                .set_approval_for_all(caller, operator, *approved)
                .map(|_| String::new())
        }
        Action::TransferPoint {
            point,
            target,
            reset,
        } => {
            let point = parse_point(point)?;
            let target = chain.resolve(target)?;
            chain
                .transfer_point(caller, point, target, *reset)
                .map(|_| String::new())
        }
        Action::SafeTransferPoint { point, from, to } => {
            let point = parse_point(point)?;
            let from = chain.resolve(from)?;
            let to = chain.resolve(to)?;
            chain
                .safe_transfer_from(caller, from, to, point)
                .map(|_| String::new())
        }
        Action::UnsafeTransferPoint { point, from, to } => {
            let point = parse_point(point)?;
            let from = chain.resolve(from)?;
            let to = chain.resolve(to)?;
            chain
                .transfer_from(caller, from, to, point)
                .map(|_| String::new())
        }
        Action::Deposit { point } => {
            let point = parse_point(point)?;
            chain.deposit(caller, point).map(|_| String::new())
        }
        Action::Redeem { expect } => {
            let expected = expect.as_deref().map(parse_point).transpose()?;
            // Check the star before committing; a failing preview is left to
            // the real call to report.
            if let (Some(want), Ok(next)) = (expected, chain.redeem_preview(caller)) {
                if next != want {
                    return Ok(Executed::Mismatch(format!(
                        "redeem would return {:#x}, expected {:#x}",
                        next, want
                    )));
                }
            }
            chain
                .redeem(caller)
                .map(|receipt| format!("{:#x}", receipt.value))
        }
        Action::TokenTransfer { to, amount } => {
            let to = chain.resolve(to)?;
            let amount = parse_amount(amount)?;
            chain
                .token_transfer(caller, to, amount)
                .map(|_| String::new())
        }
        Action::TokenApprove { spender, amount } => {
            let spender = chain.resolve(spender)?;
            let amount = parse_amount(amount)?;
            chain
                .token_approve(caller, spender, amount)
                .map(|_| String::new())
        }
        Action::TokenTransferFrom { from, to, amount } => {
            let from = chain.resolve(from)?;
            let to = chain.resolve(to)?;
            let amount = parse_amount(amount)?;
            chain
                .token_transfer_from(caller, from, to, amount)
                .map(|_| String::new())
        }
        Action::TokenSend { to, amount } => {
            let to = chain.resolve(to)?;
            let amount = parse_amount(amount)?;
            chain.token_send(caller, to, amount).map(|_| String::new())
        }
        Action::AuthorizeOperator { operator } => {
            let operator = chain.resolve(operator)?;
            chain
                .authorize_operator(caller, operator)
                .map(|_| String::new())
        }
        Action::RevokeOperator { operator } => {
            let operator = chain.resolve(operator)?;
            chain
                .revoke_operator(caller, operator)
                .map(|_| String::new())
        }
        Action::OperatorSend { holder, to, amount } => {
            let holder = chain.resolve(holder)?;
            let to = chain.resolve(to)?;
            let amount = parse_amount(amount)?;
            chain
                .operator_send(caller, holder, to, amount)
                .map(|_| String::new())
        }
        Action::OperatorBurn { holder, amount } => {
            let holder = chain.resolve(holder)?;
            let amount = parse_amount(amount)?;
            chain
                .operator_burn(caller, holder, amount)
                .map(|_| String::new())
        }
        Action::DeployImplementation => {
            let address = chain.deploy_implementation(caller);
            *latest_impl = Some(address);
            Ok(address.to_string())
        }
        Action::UpgradeTreasury { implementation } => {
            let implementation = match (implementation.as_str(), *latest_impl) {
                ("latest", Some(address)) => address,
                ("latest", None) => {
                    return Err(WstarError::InvalidState(
                        "No implementation deployed in this scenario".to_string(),
                    ))
                }
                (name, _) => chain.resolve(name)?,
            };
            chain
                .upgrade_treasury(caller, implementation)
                .map(|_| String::new())
        }
        Action::FreezeTreasury => chain.freeze_treasury(caller).map(|_| String::new()),
        Action::AssertOwner { point, owner } => {
            let point = parse_point(point)?;
            let owner = chain.resolve(owner)?;
            let actual = chain.azimuth().get_owner(point);
            if actual != owner {
                return Ok(Executed::Mismatch(format!(
                    "point {:#x} is owned by {}, expected {}",
                    point,
                    chain.name_of(actual),
                    chain.name_of(owner)
                )));
            }
            Ok(String::new())
        }
        Action::AssertBalance { holder, amount } => {
            let holder = chain.resolve(holder)?;
            let expected = parse_amount(amount)?;
            let actual = chain.token().balance_of(holder);
            if actual != expected {
                return Ok(Executed::Mismatch(format!(
                    "{} holds {}, expected {}",
                    chain.name_of(holder),
                    Stars::from_units(actual),
                    Stars::from_units(expected)
                )));
            }
            Ok(String::new())
        }
        Action::AssertAllowance {
            owner,
            spender,
            amount,
        } => {
            let owner = chain.resolve(owner)?;
            let spender = chain.resolve(spender)?;
            let expected = parse_amount(amount)?;
            let actual = chain.token().allowance(owner, spender);
            if actual != expected {
                return Ok(Executed::Mismatch(format!(
                    "{} may spend {} of {}, expected {}",
                    chain.name_of(spender),
                    Stars::from_units(actual),
                    chain.name_of(owner),
                    Stars::from_units(expected)
                )));
            }
            Ok(String::new())
        }
        Action::AssertAssetCount { count } => match chain.asset_count() {
            Ok(actual) if actual != *count => {
                return Ok(Executed::Mismatch(format!(
                    "treasury holds {} stars, expected {}",
                    actual, count
                )))
            }
            other => other.map(|_| String::new()),
        },
    };
    Ok(Executed::Call(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainConfig;

    const SETUP: &str = r#"
name = "setup"

[[step]]
as = "deployer"
action = "create_galaxy"
galaxy = "0x0"
target = "deployer"

[[step]]
action = "configure_keys"
point = "0"
encryption_key = "0x01"
authentication_key = "0x02"

[[step]]
action = "set_spawn_proxy"
prefix = "0x0"
proxy = "treasury"
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::parse(SETUP).unwrap();
        assert_eq!(scenario.name, "setup");
        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(scenario.steps[0].action.name(), "create_galaxy");
        assert_eq!(scenario.steps[1].actor, "deployer");
        assert!(matches!(
            scenario.steps[1].action,
            Action::ConfigureKeys {
                crypto_suite_version: 1,
                discontinuous: false,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let result = Scenario::parse("[[step]]\naction = \"launch_rocket\"\n");
        assert!(matches!(result, Err(WstarError::Config(_))));
    }

    #[test]
    fn test_run_deposit_redeem() {
        let input = format!(
            "{}{}",
            SETUP,
            r#"
[[step]]
as = "mallory"
action = "deposit"
point = "0x100"
expect_error = "unauthorized"

[[step]]
action = "deposit"
point = "0x100"

[[step]]
action = "assert_balance"
holder = "deployer"
amount = "1"

[[step]]
action = "redeem"
expect = "0x100"

[[step]]
action = "redeem"
expect_error = "no_assets"

[[step]]
action = "assert_asset_count"
count = 0
"#
        );
        let scenario = Scenario::parse(&input).unwrap();
        let mut chain = Chain::new(ChainConfig::default());
        let report = scenario.run(&mut chain).unwrap();
        assert!(report.passed(), "{:?}", report.failures().collect::<Vec<_>>());
        assert_eq!(report.steps.len(), 9);
        assert_eq!(report.steps[6].detail, "0x100");
        assert_eq!(report.steps[7].result, "no_assets");
    }

    #[test]
    fn test_run_stops_at_mismatch() {
        let input = r#"
[[step]]
as = "mallory"
action = "create_galaxy"
galaxy = "0x1"
target = "mallory"

[[step]]
action = "create_galaxy"
galaxy = "0x1"
target = "deployer"
"#;
        let scenario = Scenario::parse(input).unwrap();
        let mut chain = Chain::new(ChainConfig::default());
        let report = scenario.run(&mut chain).unwrap();
        assert!(!report.passed());
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].result, "unauthorized");
    }

    #[test]
    fn test_redeem_expectation_checked_before_commit() {
        let input = format!(
            "{}{}",
            SETUP,
            r#"
[[step]]
action = "deposit"
point = "0x100"

[[step]]
action = "redeem"
expect = "0x200"
expect_error = "invalid_state"
"#
        );
        let scenario = Scenario::parse(&input).unwrap();
        let mut chain = Chain::new(ChainConfig::default());
        let report = scenario.run(&mut chain).unwrap();
        assert!(!report.passed());
        let last = &report.steps[4];
        assert_eq!(last.result, MISMATCH);
        assert!(!last.passed);

        // The star is still escrowed and the WSTR was not burned
        let d = chain.deployment();
        assert!(chain.azimuth().is_owner(Point::new(0x100), d.treasury));
        assert_eq!(chain.asset_count().unwrap(), 1);
        assert_eq!(
            chain.token().balance_of(d.deployer),
            wstar_treasury::ONE_STAR
        );
    }

    #[test]
    fn test_failed_assertion_is_not_an_error_kind() {
        let input = r#"
[[step]]
action = "assert_asset_count"
count = 3
expect_error = "invalid_state"
"#;
        let scenario = Scenario::parse(input).unwrap();
        let mut chain = Chain::new(ChainConfig::default());
        let report = scenario.run(&mut chain).unwrap();
        assert!(!report.passed());
        assert_eq!(report.steps[0].result, MISMATCH);
    }

    #[test]
    fn test_run_token_allowance_steps() {
        let input = format!(
            "{}{}",
            SETUP,
            r#"
[[step]]
action = "deposit"
point = "0x100"

[[step]]
action = "token_approve"
spender = "operator"
amount = "0.75"

[[step]]
as = "operator"
action = "token_transfer_from"
from = "deployer"
to = "mallory"
amount = "0.5"

[[step]]
action = "assert_allowance"
owner = "deployer"
spender = "operator"
amount = "0.25"

[[step]]
as = "operator"
action = "token_transfer_from"
from = "deployer"
to = "operator"
amount = "0.5"
expect_error = "insufficient_allowance"

[[step]]
action = "token_send"
to = "operator"
amount = "0.25"

[[step]]
as = "operator"
action = "authorize_operator"
operator = "mallory"

[[step]]
as = "mallory"
action = "operator_send"
holder = "operator"
to = "mallory"
amount = "0.25"

[[step]]
action = "assert_balance"
holder = "mallory"
amount = "0.75"

[[step]]
action = "assert_balance"
holder = "deployer"
amount = "0.25"
"#
        );
        let scenario = Scenario::parse(&input).unwrap();
        let mut chain = Chain::new(ChainConfig::default());
        let report = scenario.run(&mut chain).unwrap();
        assert!(report.passed(), "{:?}", report.failures().collect::<Vec<_>>());
        assert_eq!(report.steps.len(), 13);
        assert_eq!(report.steps[7].result, "insufficient_allowance");
    }

    #[test]
    fn test_malformed_step_is_an_error() {
        let input = "[[step]]\naction = \"deposit\"\npoint = \"star\"\n";
        let scenario = Scenario::parse(input).unwrap();
        let mut chain = Chain::new(ChainConfig::default());
        assert!(matches!(
            scenario.run(&mut chain),
            Err(WstarError::Parse(_))
        ));
    }
}
