use clap::{Subcommand, ValueEnum};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, Write};

use stocksheet_core::{Item, SyncClient};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum InventoryCommand {
    /// List all items
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show items whose name contains this text
        #[arg(long, short)]
        search: Option<String>,
    },

    /// List items at or below their reorder threshold
    Alerts {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a new item
    Add {
        /// Item name (must be unique, accents and case ignored)
        name: String,

        /// Initial stock level
        #[arg(long, default_value_t = 0.0)]
        stock: f64,

        /// Reorder threshold (0 disables alerting)
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,

        /// Extra column value as HEADER=VALUE (can be repeated)
        #[arg(long = "detail", value_name = "HEADER=VALUE")]
        details: Vec<String>,
    },

    /// Set an item's stock level
    SetStock {
        /// Item name
        name: String,

        /// New stock level
        value: f64,
    },

    /// Set an item's reorder threshold
    SetThreshold {
        /// Item name
        name: String,

        /// New threshold (0 disables alerting)
        value: f64,
    },

    /// Edit an item's detail cells
    Edit {
        /// Item name
        name: String,

        /// Cell update as HEADER=VALUE (can be repeated)
        #[arg(long = "set", value_name = "HEADER=VALUE")]
        sets: Vec<String>,

        /// Rename the item
        #[arg(long)]
        rename: Option<String>,
    },

    /// Delete an item
    Delete {
        /// Item name
        name: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl InventoryCommand {
    pub async fn run(&self, client: &mut SyncClient) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            InventoryCommand::List { format, search } => {
                client.load().await?;

                let needle = search.as_deref().map(str::to_lowercase);
                let items: Vec<&Item> = client
                    .items()
                    .iter()
                    .filter(|item| match &needle {
                        Some(n) => item.name.to_lowercase().contains(n),
                        None => true,
                    })
                    .collect();

                if items.is_empty() {
                    println!("No items found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&items)?);
                    }
                    OutputFormat::Text => {
                        print_item_table(&items);
                        println!("\nTotal: {} item(s)", items.len());
                        if !client.has_threshold_column() {
                            println!("Note: the sheet has no threshold column; alerts are unavailable.");
                        }
                    }
                }
                Ok(())
            }

            InventoryCommand::Alerts { format } => {
                client.load().await?;

                if !client.has_threshold_column() {
                    return Err(
                        "the sheet has no threshold column. Add a column named \"Seuil\"."
                            .into(),
                    );
                }

                let alerts = client.alerts();
                if alerts.is_empty() {
                    println!("All stock levels are above their thresholds");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&alerts)?);
                    }
                    OutputFormat::Text => {
                        print_item_table(&alerts);
                        println!("\n{} item(s) need restocking", alerts.len());
                    }
                }
                Ok(())
            }

            InventoryCommand::Add {
                name,
                stock,
                threshold,
                details,
            } => {
                if name.trim().is_empty() {
                    return Err("Item name cannot be empty".into());
                }
                let details = parse_kv_pairs(details)?;

                client.load().await?;
                client.add(name.trim(), *stock, *threshold, details).await?;
                println!("Added '{}' (stock {})", name.trim(), stock);
                Ok(())
            }

            InventoryCommand::SetStock { name, value } => {
                client.load().await?;
                client.set_stock(name, *value).await?;
                println!("Stock of '{}' set to {}", name, value);
                Ok(())
            }

            InventoryCommand::SetThreshold { name, value } => {
                client.load().await?;
                client.set_threshold(name, *value).await?;
                println!("Threshold of '{}' set to {}", name, value);
                Ok(())
            }

            InventoryCommand::Edit { name, sets, rename } => {
                let mut updates = parse_kv_pairs(sets)?;
                if let Some(new_name) = rename {
                    updates.insert("_newName".to_string(), Value::String(new_name.clone()));
                }
                if updates.is_empty() {
                    return Err("Nothing to update. Use --set or --rename.".into());
                }

                client.load().await?;
                client.set_details(name, updates).await?;
                println!("Updated '{}'", name);
                Ok(())
            }

            InventoryCommand::Delete { name, force } => {
                if !force && !confirm(&format!("Delete '{}'? [y/N] ", name))? {
                    println!("Cancelled");
                    return Ok(());
                }

                client.load().await?;
                client.remove(name).await?;
                println!("Deleted '{}'", name);
                Ok(())
            }
        }
    }
}

fn print_item_table(items: &[&Item]) {
    println!("{:<30}  {:>10}  {:>10}", "NAME", "STOCK", "THRESHOLD");
    println!("{}", "-".repeat(56));
    for item in items {
        let marker = if item.is_low_stock() { "  [LOW]" } else { "" };
        println!(
            "{:<30}  {:>10}  {:>10}{}",
            item.name, item.stock, item.threshold, marker
        );
    }
}

/// Parses repeated `HEADER=VALUE` arguments into an update map. Values stay
/// strings; the backend matches headers under normalization.
fn parse_kv_pairs(pairs: &[String]) -> Result<BTreeMap<String, Value>, String> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!("expected HEADER=VALUE, got '{}'", pair));
        };
        if key.trim().is_empty() {
            return Err(format!("empty header in '{}'", pair));
        }
        map.insert(key.trim().to_string(), Value::String(value.to_string()));
    }
    Ok(map)
}

fn confirm(prompt: &str) -> Result<bool, io::Error> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
