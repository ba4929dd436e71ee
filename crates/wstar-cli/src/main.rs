// crates/wstar-cli/src/main.rs
//
// CLI entrypoint for the WrappedStar treasury.
//
// Every command loads the saved chain, performs one call as the acting
// account (`--as`), saves the chain, and prints the emitted events.

mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use commands::admin::AdminCmd;
use commands::deposit::DepositCmd;
use commands::events::EventsCmd;
use commands::init::InitCmd;
use commands::points::{GalaxyCmd, KeysCmd, SpawnCmd, TransferCmd};
use commands::proxy::ProxyCmd;
use commands::redeem::RedeemCmd;
use commands::scenario::ScenarioCmd;
use commands::token::TokenCmd;
use commands::Context;
use config::{default_config_path, expand_home, CliConfig};
use output::OutputFormat;
use wstar_chain::JsonFileStore;

/// WrappedStar CLI: escrow Azimuth stars for fungible tokens.
#[derive(Parser, Debug)]
#[command(
    name = "wstar",
    version = "0.1.0",
    about = "WrappedStar treasury: deposit stars, mint WSTR, redeem stars"
)]
struct Cli {
    /// Path to the config file.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Path to the chain snapshot (overrides the config).
    #[arg(long, global = true)]
    state: Option<String>,

    /// Account to act as: a label, a contract name, or a 0x address.
    #[arg(long = "as", global = true)]
    actor: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Deploy a fresh chain.
    Init(InitCmd),

    /// Create a galaxy (Ecliptic owner only).
    Galaxy(GalaxyCmd),

    /// Configure networking keys of a point.
    Keys(KeysCmd),

    /// Spawn a point under its prefix.
    Spawn(SpawnCmd),

    /// Spawn proxy, transfer proxy, and operator approvals.
    #[command(subcommand)]
    Proxy(ProxyCmd),

    /// Transfer a point.
    Transfer(TransferCmd),

    /// Deposit a star into the treasury.
    Deposit(DepositCmd),

    /// Redeem the most recently deposited star.
    Redeem(RedeemCmd),

    /// List escrowed stars.
    Assets,

    /// Token queries and transfers.
    #[command(subcommand)]
    Token(TokenCmd),

    /// Treasury proxy administration.
    #[command(subcommand)]
    Admin(AdminCmd),

    /// Show the event log.
    Events(EventsCmd),

    /// Run a scenario file.
    Scenario(ScenarioCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found.
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let (config, config_error) = match CliConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (CliConfig::default(), Some(e.to_string())),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    match config_error {
        None => tracing::debug!("Loaded configuration from {}", config_path),
        // An explicitly named config must exist
        Some(e) if cli.config.is_some() => {
            return Err(format!("Failed to load config {}: {}", config_path, e).into())
        }
        Some(e) => tracing::debug!("Using default configuration ({}: {})", config_path, e),
    }

    let state_file = match &cli.state {
        Some(path) => expand_home(path),
        None => config.state_file(),
    };
    let ctx = Context {
        store: JsonFileStore::new(state_file),
        actor: cli.actor.clone().unwrap_or_else(|| config.actor.clone()),
        deployer: cli.actor.clone().unwrap_or_else(|| config.deployer.clone()),
        format: OutputFormat::select(cli.json, &config.output),
    };

    match &cli.command {
        Commands::Init(cmd) => commands::init::run(&ctx, cmd).await?,
        Commands::Galaxy(cmd) => commands::points::run_galaxy(&ctx, cmd).await?,
        Commands::Keys(cmd) => commands::points::run_keys(&ctx, cmd).await?,
        Commands::Spawn(cmd) => commands::points::run_spawn(&ctx, cmd).await?,
        Commands::Proxy(cmd) => commands::proxy::run(&ctx, cmd).await?,
        Commands::Transfer(cmd) => commands::points::run_transfer(&ctx, cmd).await?,
        Commands::Deposit(cmd) => commands::deposit::run(&ctx, cmd).await?,
        Commands::Redeem(cmd) => commands::redeem::run(&ctx, cmd).await?,
        Commands::Assets => commands::assets::run(&ctx).await?,
        Commands::Token(cmd) => commands::token::run(&ctx, cmd).await?,
        Commands::Admin(cmd) => commands::admin::run(&ctx, cmd).await?,
        Commands::Events(cmd) => commands::events::run(&ctx, cmd).await?,
        Commands::Scenario(cmd) => commands::scenario::run(&ctx, cmd).await?,
    }

    Ok(())
}
