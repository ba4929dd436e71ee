// crates/wstar-cli/src/commands/proxy.rs
//
// `wstar proxy {spawn, transfer, operator}`: delegate rights over points.

use clap::Subcommand;

use super::{parse_point, Context};

/// Point delegation subcommands.
#[derive(Debug, Subcommand)]
pub enum ProxyCmd {
    /// Let `proxy` spawn children of `prefix`.
    Spawn { prefix: String, proxy: String },
    /// Let `proxy` transfer `point` once.
    Transfer { point: String, proxy: String },
    /// Let `operator` act on all of the acting account's points.
    Operator {
        operator: String,
        /// Withdraw the approval instead.
        #[arg(long)]
        revoke: bool,
    },
}

/// Run the proxy subcommand.
pub async fn run(ctx: &Context, cmd: &ProxyCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;
    let caller = ctx.caller(&mut chain)?;

    let receipt = match cmd {
        ProxyCmd::Spawn { prefix, proxy } => {
            let prefix = parse_point(prefix)?;
            let proxy = chain.resolve(proxy)?;
            chain.set_spawn_proxy(caller, prefix, proxy)?
        }
        ProxyCmd::Transfer { point, proxy } => {
            let point = parse_point(point)?;
            let proxy = chain.resolve(proxy)?;
            chain.set_transfer_proxy(caller, point, proxy)?
        }
        ProxyCmd::Operator { operator, revoke } => {
            let operator = chain.resolve(operator)?;
            chain.set_approval_for_all(caller, operator, !revoke)?
        }
    };
    ctx.commit(&chain, &receipt).await
}
