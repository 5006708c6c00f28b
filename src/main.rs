use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stocksheet::commands::{ConfigCommand, InventoryCommand};
use stocksheet::Config;
use stocksheet_core::{SyncClient, SyncError};

#[derive(Parser)]
#[command(name = "stocksheet")]
#[command(version)]
#[command(about = "Inventory tracking over a spreadsheet backend", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Inventory(InventoryCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.clone())?;

    match cli.command {
        Some(Commands::Inventory(cmd)) => {
            let mut client = connect(&config)?;
            cmd.run(&mut client).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config, cli.config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Builds the sync client, turning a missing endpoint into an actionable
/// message instead of a bare error.
fn connect(config: &Config) -> Result<SyncClient, Box<dyn std::error::Error>> {
    SyncClient::new(config.server_url.clone()).map_err(|e| match e {
        SyncError::NotConfigured => {
            "no backend URL configured. Run: stocksheet config set-url <URL>".into()
        }
        other => other.into(),
    })
}
