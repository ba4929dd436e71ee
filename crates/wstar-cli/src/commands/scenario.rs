// crates/wstar-cli/src/commands/scenario.rs
//
// `wstar scenario <file>`: run a TOML scenario against the chain.

use clap::Args;
use tabled::Tabled;

use wstar_chain::{Chain, ChainConfig, Scenario};

use crate::output::{format_json, format_table, OutputFormat};

use super::Context;

/// Run a scenario file.
#[derive(Debug, Args)]
pub struct ScenarioCmd {
    /// Path to the scenario TOML.
    pub file: String,

    /// Run on a freshly deployed chain instead of the saved one.
    #[arg(long)]
    pub fresh: bool,

    /// Do not save the resulting chain.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "As")]
    actor: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Pass")]
    pass: String,
}

/// Run the scenario command.
pub async fn run(ctx: &Context, cmd: &ScenarioCmd) -> Result<(), Box<dyn std::error::Error>> {
    let input = tokio::fs::read_to_string(&cmd.file).await?;
    let scenario = Scenario::parse(&input)?;

    let mut chain = if cmd.fresh {
        Chain::new(ChainConfig::default())
    } else {
        ctx.load().await?
    };
    let report = scenario.run(&mut chain)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&report)),
        OutputFormat::Table => {
            let rows: Vec<StepRow> = report
                .steps
                .iter()
                .map(|s| StepRow {
                    index: s.index,
                    actor: s.actor.clone(),
                    action: s.action.clone(),
                    result: s.result.clone(),
                    pass: if s.passed { "yes" } else { "NO" }.to_string(),
                })
                .collect();
            println!("{}", format_table(&rows));
        }
    }

    if !report.passed() {
        let failed: Vec<String> = report
            .failures()
            .map(|s| format!("step {} ({}): {}", s.index, s.action, s.detail))
            .collect();
        return Err(format!("Scenario failed at {}", failed.join("; ")).into());
    }
    if !cmd.dry_run {
        ctx.save(&chain).await?;
    }
    Ok(())
}
