// crates/wstar-cli/src/commands/points.rs
//
// `wstar {galaxy, keys, spawn, transfer}`: point issuance and movement
// through the Ecliptic.

use clap::Args;

use wstar_core::crypto::parse_key;

use super::{parse_point, Context};

/// Create a galaxy (Ecliptic owner only).
#[derive(Debug, Args)]
pub struct GalaxyCmd {
    /// Galaxy number (0-255, decimal or 0x hex).
    pub galaxy: String,

    /// Recipient. Defaults to the acting account.
    #[arg(long)]
    pub to: Option<String>,
}

/// Configure networking keys of a point. The first configuration links it.
#[derive(Debug, Args)]
pub struct KeysCmd {
    pub point: String,

    /// Encryption key, hex.
    #[arg(long)]
    pub encryption: String,

    /// Authentication key, hex.
    #[arg(long)]
    pub authentication: String,

    /// Crypto suite version.
    #[arg(long, default_value = "1")]
    pub suite: u32,

    /// Declare a continuity breach.
    #[arg(long)]
    pub breach: bool,
}

/// Spawn a star under a galaxy or a planet under a star.
#[derive(Debug, Args)]
pub struct SpawnCmd {
    pub point: String,

    /// Recipient. Defaults to the acting account.
    #[arg(long)]
    pub to: Option<String>,
}

/// Transfer a point.
#[derive(Debug, Args)]
pub struct TransferCmd {
    pub point: String,

    /// Recipient.
    pub to: String,

    /// Ask a contract recipient to accept the point first.
    #[arg(long, conflicts_with = "keep_keys")]
    pub safe: bool,

    /// Keep keys and spawn proxy instead of resetting them.
    #[arg(long)]
    pub keep_keys: bool,
}

/// Run the galaxy command.
pub async fn run_galaxy(ctx: &Context, cmd: &GalaxyCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;
    let caller = ctx.caller(&mut chain)?;
    let galaxy = parse_point(&cmd.galaxy)?;
    let target = match &cmd.to {
        Some(name) => chain.resolve(name)?,
        None => caller,
    };
    let receipt = chain.create_galaxy(caller, galaxy, target)?;
    ctx.commit(&chain, &receipt).await
}

/// Run the keys command.
pub async fn run_keys(ctx: &Context, cmd: &KeysCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;
    let caller = ctx.caller(&mut chain)?;
    let point = parse_point(&cmd.point)?;
    let encryption = parse_key(&cmd.encryption)?;
    let authentication = parse_key(&cmd.authentication)?;
    let receipt = chain.configure_keys(
        caller,
        point,
        encryption,
        authentication,
        cmd.suite,
        cmd.breach,
    )?;
    ctx.commit(&chain, &receipt).await
}

/// Run the spawn command.
pub async fn run_spawn(ctx: &Context, cmd: &SpawnCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;
    let caller = ctx.caller(&mut chain)?;
    let point = parse_point(&cmd.point)?;
    let target = match &cmd.to {
        Some(name) => chain.resolve(name)?,
        None => caller,
    };
    let receipt = chain.spawn(caller, point, target)?;
    ctx.commit(&chain, &receipt).await
}

/// Run the transfer command.
pub async fn run_transfer(ctx: &Context, cmd: &TransferCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;
    let caller = ctx.caller(&mut chain)?;
    let point = parse_point(&cmd.point)?;
    let to = chain.resolve(&cmd.to)?;
    let owner = chain.azimuth().get_owner(point);

    let receipt = if cmd.keep_keys {
        chain.transfer_point(caller, point, to, false)?
    } else if cmd.safe {
        chain.safe_transfer_from(caller, owner, to, point)?
    } else {
        chain.transfer_from(caller, owner, to, point)?
    };
    ctx.commit(&chain, &receipt).await
}
