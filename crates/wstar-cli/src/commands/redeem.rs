// crates/wstar-cli/src/commands/redeem.rs
//
// `wstar redeem [--preview]`: burn ONE_STAR for the most recently deposited star.

use clap::Args;

use crate::output::{format_json, OutputFormat};

use super::Context;

/// Redeem one star from the treasury.
#[derive(Debug, Args)]
pub struct RedeemCmd {
    /// Show which star would be returned without redeeming.
    #[arg(long)]
    pub preview: bool,
}

/// Run the redeem command.
pub async fn run(ctx: &Context, cmd: &RedeemCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;
    let caller = ctx.caller(&mut chain)?;

    if cmd.preview {
        let star = chain.redeem_preview(caller)?;
        match ctx.format {
            OutputFormat::Json => println!(
                "{}",
                format_json(&serde_json::json!({ "star": star, "preview": true }))
            ),
            OutputFormat::Table => println!("Redeem would return star {:#x}", star),
        }
        return Ok(());
    }

    let receipt = chain.redeem(caller)?;
    if ctx.format == OutputFormat::Table {
        println!("Redeemed star {:#x}", receipt.value);
    }
    ctx.commit(&chain, &receipt).await
}
