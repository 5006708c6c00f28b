//! Client sync layer.
//!
//! [`SyncClient`] maintains a local item list synchronized with the
//! backend's single JSON endpoint. Stock updates are optimistic with
//! revert-by-reload on failure; threshold updates surface failures without
//! reloading; detail edits and adds apply only after confirmation. See each
//! method for its exact recovery contract.

mod client;
mod error;
mod state;

pub use client::SyncClient;
pub use error::SyncError;
pub use state::SyncState;
