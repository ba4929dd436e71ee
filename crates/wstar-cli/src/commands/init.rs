// crates/wstar-cli/src/commands/init.rs
//
// `wstar init`: deploy a fresh chain and save it.

use clap::Args;

use wstar_chain::{Chain, ChainConfig};
use wstar_core::Address;
use wstar_treasury::TokenMetadata;

use crate::output::{print_fields, FieldRow};

use super::Context;

/// Deploy the registry, Ecliptic, token and treasury.
#[derive(Debug, Args)]
pub struct InitCmd {
    /// Overwrite an existing chain.
    #[arg(long)]
    pub force: bool,

    /// Mint the legacy StarToken (STAR) instead of WrappedStar (WSTR).
    #[arg(long)]
    pub legacy_token: bool,
}

/// Run the init command.
pub async fn run(ctx: &Context, cmd: &InitCmd) -> Result<(), Box<dyn std::error::Error>> {
    if !cmd.force && ctx.store.path().exists() {
        return Err(format!(
            "A chain already exists at {}. Use --force to replace it.",
            ctx.store.path().display()
        )
        .into());
    }

    let deployer = match ctx.deployer.parse::<Address>() {
        Ok(address) if ctx.deployer.starts_with("0x") => address,
        _ => Address::from_label(&ctx.deployer),
    };
    let token = if cmd.legacy_token {
        TokenMetadata::star_token()
    } else {
        TokenMetadata::wrapped_star()
    };
    let mut chain = Chain::new(ChainConfig { deployer, token });
    // Remember the deployer's label for display
    chain.resolve(&ctx.deployer)?;
    ctx.save(&chain).await?;
    tracing::info!("Initialized chain at {}", ctx.store.path().display());

    let d = chain.deployment();
    print_fields(
        vec![
            FieldRow::new("state", ctx.store.path().display()),
            FieldRow::new("deployer", d.deployer),
            FieldRow::new("azimuth", d.azimuth),
            FieldRow::new("ecliptic", d.ecliptic),
            FieldRow::new("treasury", d.treasury),
            FieldRow::new("token", d.token),
            FieldRow::new("symbol", chain.token().symbol()),
        ],
        ctx.format,
    );
    Ok(())
}
