//! Header-role inference for the backing table.
//!
//! The sheet is schema-less: which column holds the item name, the stock
//! level or the reorder threshold is inferred from the live header row on
//! every request, by substring match against normalized headers. Columns
//! can be renamed, reordered or added without breaking the client contract.

use crate::normalize::normalize;

/// Substring that marks the name column.
pub const NAME_KEYWORD: &str = "nom";
/// Substring that marks the stock column.
pub const STOCK_KEYWORD: &str = "stock";
/// Any of these substrings marks the threshold column.
pub const THRESHOLD_KEYWORDS: [&str; 4] = ["seuil", "alerte", "min", "limite"];

/// Positional fallback for the name column (column B in the legacy layout).
pub const FALLBACK_NAME_COLUMN: usize = 1;
/// Positional fallback for the stock column (column E in the legacy layout).
pub const FALLBACK_STOCK_COLUMN: usize = 4;

/// Resolved column roles for one request. Never cached across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRoles {
    /// Index of the name column.
    pub name: usize,
    /// Index of the stock column.
    pub stock: usize,
    /// Index of the threshold column, if one resolves. `None` means
    /// threshold operations are unsupported for this table, not an error.
    pub threshold: Option<usize>,
}

/// Infers column roles from the header row.
///
/// Total: always returns roles, falling back to fixed indices for name and
/// stock when no header matches. The fallback indices may lie beyond the
/// actual header row; callers index rows with `get` accordingly.
pub fn detect_columns(headers: &[String]) -> ColumnRoles {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();

    let name = normalized
        .iter()
        .position(|h| h.contains(NAME_KEYWORD))
        .unwrap_or(FALLBACK_NAME_COLUMN);

    let stock = normalized
        .iter()
        .position(|h| h.contains(STOCK_KEYWORD))
        .unwrap_or(FALLBACK_STOCK_COLUMN);

    let threshold = normalized
        .iter()
        .position(|h| THRESHOLD_KEYWORDS.iter().any(|k| h.contains(k)));

    ColumnRoles {
        name,
        stock,
        threshold,
    }
}
