//! Sync error types.

use thiserror::Error;

/// Errors that can occur in the client sync layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No backend endpoint configured (empty or placeholder URL).
    #[error("no backend URL configured. Set the endpoint URL first.")]
    NotConfigured,
    /// Network or response-parse failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Structured error reported by the backend (not found, duplicate,
    /// missing threshold column, ...), carrying its message verbatim.
    #[error("{0}")]
    Backend(String),
    /// The response shape reveals an outdated backend deployment.
    #[error("backend deployment is out of date. Deploy a new version of the endpoint script.")]
    StaleBackend,
}
