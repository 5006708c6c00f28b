mod config_cmd;
mod inventory;

pub use config_cmd::ConfigCommand;
pub use inventory::{InventoryCommand, OutputFormat};
