// crates/wstar-cli/src/commands/assets.rs
//
// `wstar assets`: list the escrowed stars, oldest first.

use tabled::Tabled;

use crate::output::{format_json, format_table, OutputFormat};

use super::Context;

/// A row in the asset listing.
#[derive(Debug, Tabled)]
struct AssetRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Star")]
    star: String,
    #[tabled(rename = "Galaxy")]
    galaxy: String,
}

/// Run the assets command.
pub async fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let chain = ctx.load().await?;
    let assets = chain.all_assets()?;

    match ctx.format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "count": assets.len(),
                "assets": assets,
                "next_redeem": assets.last(),
            });
            println!("{}", format_json(&body));
        }
        OutputFormat::Table => {
            println!("Escrowed stars: {}", assets.len());
            if let Some(next) = assets.last() {
                println!("Next redeem:    {:#x}", next);
            }
            if !assets.is_empty() {
                let rows: Vec<AssetRow> = assets
                    .iter()
                    .enumerate()
                    .map(|(index, star)| AssetRow {
                        index,
                        star: format!("{:#x}", star),
                        galaxy: star.parent_galaxy().to_string(),
                    })
                    .collect();
                println!("{}", format_table(&rows));
            }
        }
    }
    Ok(())
}
