//! Stocksheet backend server.
//!
//! Hosts the single action-dispatched JSON endpoint over a CSV-backed
//! inventory table.
//!
//! # Configuration
//!
//! Environment variables:
//! - `STOCKSHEET_PORT`: Port to listen on (default: 8080)
//! - `STOCKSHEET_SHEET`: Path of the backing CSV file
//!   (default: `<data dir>/stocksheet/inventory.csv`)
//!
//! # Endpoints
//!
//! - `GET /?action=read`: full item list
//! - `POST /`: mutations, JSON body `{action, name, ...}`
//! - `GET /health`: health check

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stocksheet::server::{router, ServerConfig};
use stocksheet_core::{CsvSheet, RowStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stocksheet=info,stocksheet_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    if let Some(parent) = config.sheet_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!("Failed to create sheet directory: {}", e);
            std::process::exit(1);
        }
    }

    tracing::info!("Sheet file: {}", config.sheet_path.display());

    let store = Arc::new(RowStore::new(CsvSheet::new(&config.sheet_path)));
    let app = router(store);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
