//! Stocksheet application crate: client configuration, the CLI commands and
//! the backend server wiring. The reconciliation core lives in
//! `stocksheet-core`.

pub mod commands;
pub mod config;
pub mod server;

pub use config::{Config, ConfigError};
