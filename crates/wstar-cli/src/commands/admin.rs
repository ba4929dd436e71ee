// crates/wstar-cli/src/commands/admin.rs
//
// `wstar admin {status, deploy, upgrade, freeze}`: treasury proxy
// administration. Upgrades and freezes go through the Ecliptic, so the
// acting account must own it.

use clap::Subcommand;

use crate::output::{print_fields, FieldRow, OutputFormat};

use super::Context;

/// Treasury administration subcommands.
#[derive(Debug, Subcommand)]
pub enum AdminCmd {
    /// Proxy state and deployed implementations.
    Status,
    /// Deploy another copy of the treasury logic.
    Deploy,
    /// Point the treasury proxy at an implementation.
    Upgrade { implementation: String },
    /// Permanently pin the current implementation.
    Freeze,
}

/// Run the admin subcommand.
pub async fn run(ctx: &Context, cmd: &AdminCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;

    match cmd {
        AdminCmd::Status => {
            let proxy = chain.treasury();
            let mut fields = vec![
                FieldRow::new("treasury", proxy.address()),
                FieldRow::new("admin", chain.name_of(proxy.admin())),
                FieldRow::new("implementation", proxy.implementation()),
                FieldRow::new("version", chain.treasury_version()?),
                FieldRow::new("frozen", proxy.is_frozen()),
            ];
            for (address, version) in chain.implementations() {
                fields.push(FieldRow::new("deployed", format!("{} ({})", address, version)));
            }
            print_fields(fields, ctx.format);
        }
        AdminCmd::Deploy => {
            let caller = ctx.caller(&mut chain)?;
            let address = chain.deploy_implementation(caller);
            ctx.save(&chain).await?;
            match ctx.format {
                OutputFormat::Json => {
                    print_fields(vec![FieldRow::new("implementation", address)], ctx.format)
                }
                OutputFormat::Table => println!("Deployed treasury logic at {}", address),
            }
        }
        AdminCmd::Upgrade { implementation } => {
            let caller = ctx.caller(&mut chain)?;
            let implementation = chain.resolve(implementation)?;
            let receipt = chain.upgrade_treasury(caller, implementation)?;
            ctx.commit(&chain, &receipt).await?;
        }
        AdminCmd::Freeze => {
            let caller = ctx.caller(&mut chain)?;
            let receipt = chain.freeze_treasury(caller)?;
            ctx.commit(&chain, &receipt).await?;
        }
    }
    Ok(())
}
