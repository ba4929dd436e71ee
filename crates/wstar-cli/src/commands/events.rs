// crates/wstar-cli/src/commands/events.rs
//
// `wstar events`: show the event log.

use clap::Args;

use crate::output::print_events;

use super::Context;

/// Show logged events.
#[derive(Debug, Args)]
pub struct EventsCmd {
    /// Only events with this name (e.g. Deposit, Transfer).
    #[arg(long)]
    pub name: Option<String>,

    /// Only events emitted by this contract or account.
    #[arg(long)]
    pub emitter: Option<String>,

    /// Show at most the last N matching events.
    #[arg(long, default_value = "50")]
    pub last: usize,
}

/// Run the events command.
pub async fn run(ctx: &Context, cmd: &EventsCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;
    let emitter = match &cmd.emitter {
        Some(name) => Some(chain.resolve(name)?),
        None => None,
    };

    let matching: Vec<_> = chain
        .events()
        .iter()
        .filter(|e| cmd.name.as_deref().map_or(true, |n| e.event.name() == n))
        .filter(|e| emitter.map_or(true, |a| e.emitter == a))
        .cloned()
        .collect();
    let skip = matching.len().saturating_sub(cmd.last);
    print_events(&chain, &matching[skip..], ctx.format);
    Ok(())
}
