// crates/wstar-cli/src/commands/token.rs
//
// `wstar token {info, balance, allowance, holders, transfer, approve, transfer-from,
//                send, authorize, revoke, operator-send, operator-burn}`

use clap::Subcommand;
use tabled::Tabled;

use wstar_treasury::{parse_amount, Stars};

use crate::output::{format_json, format_table, print_fields, FieldRow, OutputFormat};

use super::Context;

/// Token subcommands.
#[derive(Debug, Subcommand)]
pub enum TokenCmd {
    /// Token metadata and supply.
    Info,
    /// Balance of an account (defaults to the acting account).
    Balance { holder: Option<String> },
    /// Amount `spender` may still move out of `owner`'s balance.
    Allowance { owner: String, spender: String },
    /// Every non-zero balance.
    Holders,
    /// Transfer tokens. Amounts are decimal ("1", "0.5").
    Transfer { to: String, amount: String },
    /// Allow `spender` to move up to `amount` of the acting account's tokens.
    Approve { spender: String, amount: String },
    /// Spend an allowance granted by `from`.
    TransferFrom {
        from: String,
        to: String,
        amount: String,
    },
    /// ERC-777 send.
    Send { to: String, amount: String },
    /// Authorize an operator over the acting account's tokens.
    Authorize { operator: String },
    /// Revoke an operator.
    Revoke { operator: String },
    /// Send tokens of `holder` as their operator.
    OperatorSend {
        holder: String,
        to: String,
        amount: String,
    },
    /// Burn tokens of `holder` as their operator.
    OperatorBurn { holder: String, amount: String },
}

#[derive(Debug, Tabled)]
struct HolderRow {
    #[tabled(rename = "Holder")]
    holder: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Base units")]
    units: String,
}

/// Run the token subcommand.
pub async fn run(ctx: &Context, cmd: &TokenCmd) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = ctx.load().await?;

    let receipt = match cmd {
        TokenCmd::Info => {
            let token = chain.token();
            print_fields(
                vec![
                    FieldRow::new("address", token.address()),
                    FieldRow::new("name", token.name()),
                    FieldRow::new("symbol", token.symbol()),
                    FieldRow::new("decimals", token.decimals()),
                    FieldRow::new("granularity", token.granularity()),
                    FieldRow::new("owner", chain.name_of(token.owner())),
                    FieldRow::new("total_supply", Stars::from_units(token.total_supply())),
                ],
                ctx.format,
            );
            return Ok(());
        }
        TokenCmd::Balance { holder } => {
            let name = holder.as_deref().unwrap_or(&ctx.actor);
            let address = chain.resolve(name)?;
            let balance = chain.token().balance_of(address);
            print_fields(
                vec![
                    FieldRow::new("holder", chain.name_of(address)),
                    FieldRow::new("balance", Stars::from_units(balance)),
                    FieldRow::new("units", balance),
                    FieldRow::new("redeemable_stars", Stars::from_units(balance).whole()),
                ],
                ctx.format,
            );
            return Ok(());
        }
        TokenCmd::Allowance { owner, spender } => {
            let owner = chain.resolve(owner)?;
            let spender = chain.resolve(spender)?;
            let allowance = chain.token().allowance(owner, spender);
            print_fields(
                vec![
                    FieldRow::new("owner", chain.name_of(owner)),
                    FieldRow::new("spender", chain.name_of(spender)),
                    FieldRow::new("allowance", Stars::from_units(allowance)),
                    FieldRow::new("units", allowance),
                ],
                ctx.format,
            );
            return Ok(());
        }
        TokenCmd::Holders => {
            let rows: Vec<HolderRow> = chain
                .token()
                .holders()
                .map(|(address, balance)| HolderRow {
                    holder: chain.name_of(address),
                    balance: Stars::from_units(balance).to_string(),
                    units: balance.to_string(),
                })
                .collect();
            match ctx.format {
                OutputFormat::Json => {
                    let body: Vec<serde_json::Value> = rows
                        .iter()
                        .map(|r| serde_json::json!({ "holder": r.holder, "units": r.units }))
                        .collect();
                    println!("{}", format_json(&body));
                }
                OutputFormat::Table if rows.is_empty() => println!("No holders."),
                OutputFormat::Table => println!("{}", format_table(&rows)),
            }
            return Ok(());
        }
        TokenCmd::Transfer { to, amount } => {
            let caller = ctx.caller(&mut chain)?;
            let to = chain.resolve(to)?;
            let amount = parse_amount(amount)?;
            chain.token_transfer(caller, to, amount)?
        }
        TokenCmd::Approve { spender, amount } => {
            let caller = ctx.caller(&mut chain)?;
            let spender = chain.resolve(spender)?;
            let amount = parse_amount(amount)?;
            chain.token_approve(caller, spender, amount)?
        }
        TokenCmd::TransferFrom { from, to, amount } => {
            let caller = ctx.caller(&mut chain)?;
            let from = chain.resolve(from)?;
            let to = chain.resolve(to)?;
            let amount = parse_amount(amount)?;
            chain.token_transfer_from(caller, from, to, amount)?
        }
        TokenCmd::Send { to, amount } => {
            let caller = ctx.caller(&mut chain)?;
            let to = chain.resolve(to)?;
            let amount = parse_amount(amount)?;
            chain.token_send(caller, to, amount)?
        }
        TokenCmd::Authorize { operator } => {
            let caller = ctx.caller(&mut chain)?;
            let operator = chain.resolve(operator)?;
            chain.authorize_operator(caller, operator)?
        }
        TokenCmd::Revoke { operator } => {
            let caller = ctx.caller(&mut chain)?;
            let operator = chain.resolve(operator)?;
            chain.revoke_operator(caller, operator)?
        }
        TokenCmd::OperatorSend { holder, to, amount } => {
            let caller = ctx.caller(&mut chain)?;
            let holder = chain.resolve(holder)?;
            let to = chain.resolve(to)?;
            let amount = parse_amount(amount)?;
            chain.operator_send(caller, holder, to, amount)?
        }
        TokenCmd::OperatorBurn { holder, amount } => {
            let caller = ctx.caller(&mut chain)?;
            let holder = chain.resolve(holder)?;
            let amount = parse_amount(amount)?;
            chain.operator_burn(caller, holder, amount)?
        }
    };
    ctx.commit(&chain, &receipt).await
}
