use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use stocksheet_core::SyncClient;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show,

    /// Set the backend endpoint URL
    SetUrl {
        /// The endpoint URL
        url: String,
    },

    /// Print the config file path
    Path,
}

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let path = config_path.unwrap_or_else(Config::default_config_path);

        match &self.command {
            ConfigSubcommand::Show => {
                println!("Config file: {}", path.display());
                if config.server_url.is_empty() {
                    println!("server_url: (not set)");
                } else {
                    println!("server_url: {}", config.server_url);
                }
                if !SyncClient::is_configured(&config.server_url) {
                    println!();
                    println!("No usable backend URL. Run: stocksheet config set-url <URL>");
                }
                Ok(())
            }

            ConfigSubcommand::SetUrl { url } => {
                let url = url.trim();
                if url.is_empty() {
                    return Err("URL cannot be empty".into());
                }
                let updated = Config {
                    server_url: url.to_string(),
                };
                updated.save(&path)?;
                println!("Saved endpoint URL to {}", path.display());
                Ok(())
            }

            ConfigSubcommand::Path => {
                println!("{}", path.display());
                Ok(())
            }
        }
    }
}
