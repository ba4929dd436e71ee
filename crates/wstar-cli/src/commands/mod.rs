// crates/wstar-cli/src/commands/mod.rs
//
// Command module declarations for the wstar CLI, plus the context every
// command runs with.

pub mod admin;
pub mod assets;
pub mod deposit;
pub mod events;
pub mod init;
pub mod points;
pub mod proxy;
pub mod redeem;
pub mod scenario;
pub mod token;

use wstar_chain::{load_chain, save_chain, Chain, JsonFileStore, Receipt};
use wstar_core::{Address, Point};

use crate::output::{print_events, OutputFormat};

/// Shared state of one CLI invocation.
pub struct Context {
    pub store: JsonFileStore,
    /// Actor name the command acts as.
    pub actor: String,
    /// Deployer name for `init`.
    pub deployer: String,
    pub format: OutputFormat,
}

impl Context {
    /// Load the persisted chain.
    pub async fn load(&self) -> Result<Chain, Box<dyn std::error::Error>> {
        match load_chain(&self.store).await? {
            Some(chain) => Ok(chain),
            None => Err(format!(
                "No chain at {}. Run `wstar init` first.",
                self.store.path().display()
            )
            .into()),
        }
    }

    pub async fn save(&self, chain: &Chain) -> Result<(), Box<dyn std::error::Error>> {
        save_chain(&self.store, chain).await?;
        Ok(())
    }

    /// Resolve the acting account on `chain`.
    pub fn caller(&self, chain: &mut Chain) -> Result<Address, Box<dyn std::error::Error>> {
        Ok(chain.resolve(&self.actor)?)
    }

    /// Persist the chain and print what the transaction emitted.
    pub async fn commit<T>(
        &self,
        chain: &Chain,
        receipt: &Receipt<T>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.save(chain).await?;
        if self.format == OutputFormat::Table {
            println!("Block {}", receipt.block);
        }
        print_events(chain, &receipt.events, self.format);
        Ok(())
    }
}

/// Parse a point given as decimal or `0x` hex.
pub fn parse_point(input: &str) -> Result<Point, Box<dyn std::error::Error>> {
    Ok(input.parse::<Point>()?)
}
