//! Stocksheet Core Library
//!
//! Inventory tracking over a spreadsheet-as-database: a row store adapter
//! that infers its schema from untyped headers by fuzzy matching, the JSON
//! wire protocol it speaks, and the client sync layer that keeps a local
//! cache consistent with it.

pub mod adapter;
pub mod models;
pub mod normalize;
pub mod protocol;
pub mod schema;
pub mod sheet;
pub mod sync;

pub use adapter::{ReadResult, RowStore, StoreError};
pub use models::Item;
pub use normalize::{coerce_number_str, eq_normalized, normalize};
pub use protocol::{Action, ActionRequest, ApiResponse, Status};
pub use schema::{detect_columns, ColumnRoles};
pub use sheet::{CsvSheet, SheetError, Table};
pub use sync::{SyncClient, SyncError, SyncState};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
