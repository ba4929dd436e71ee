// crates/wstar-cli/src/commands/deposit.rs
//
// `wstar deposit <star>`: hand a star to the treasury for ONE_STAR of token.

use clap::Args;

use super::{parse_point, Context};

/// Deposit a star into the treasury.
#[derive(Debug, Args)]
pub struct DepositCmd {
    /// Star to deposit (decimal or 0x hex).
    pub star: String,
}

/// Run the deposit command.
pub async fn run(ctx: &Context, cmd: &DepositCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;
    let caller = ctx.caller(&mut chain)?;
    let star = parse_point(&cmd.star)?;
    let receipt = chain.deposit(caller, star)?;
    ctx.commit(&chain, &receipt).await
}
