//! Row Store Adapter: CRUD over the backing table with fuzzy column and
//! identity resolution.
//!
//! Column roles are re-inferred from the live header row on every request
//! and identities are compared only in normalized form, so the sheet can be
//! renamed, reordered or extended without breaking the client contract. The
//! store has no row-level locking of its own, so every operation runs under
//! a single guard with a bounded acquisition wait; hitting the wait limit
//! aborts the operation instead of proceeding unguarded.

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::Item;
use crate::normalize::{cell_to_value, coerce_number_str, eq_normalized, normalize, value_to_cell};
use crate::schema::{detect_columns, ColumnRoles};
use crate::sheet::{CsvSheet, SheetError, Table};

/// How long an operation waits for the table guard before giving up.
pub const LOCK_WAIT: Duration = Duration::from_secs(5);

/// Errors surfaced by the row store adapter. All of these map to structured
/// `error` responses on the wire, never to transport failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item name is required")]
    EmptyName,
    #[error("item not found")]
    NotFound,
    #[error("an item with this name already exists")]
    Duplicate,
    #[error("no threshold column in the sheet. Add a column named \"Seuil\".")]
    MissingThresholdColumn,
    #[error("the table is busy, try again")]
    Busy,
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Result of a full table read.
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// Items in row order, one per data row with a non-empty name cell.
    pub items: Vec<Item>,
    /// Whether a threshold column resolved; when false, threshold
    /// operations are unsupported for this table but reads still work.
    pub has_threshold_column: bool,
}

/// CRUD adapter over a [`CsvSheet`], serialized by an internal guard.
#[derive(Debug)]
pub struct RowStore {
    sheet: CsvSheet,
    guard: Mutex<()>,
    lock_wait: Duration,
}

impl RowStore {
    pub fn new(sheet: CsvSheet) -> Self {
        Self {
            sheet,
            guard: Mutex::new(()),
            lock_wait: LOCK_WAIT,
        }
    }

    /// Overrides the guard acquisition wait (tests use short waits).
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Reads the full table as items. Missing threshold column degrades
    /// (items get threshold 0), it never fails the read.
    pub async fn read(&self) -> Result<ReadResult, StoreError> {
        let _guard = self.acquire().await?;
        let table = self.sheet.load()?;
        let roles = detect_columns(&table.headers);

        let items = table
            .rows
            .iter()
            .filter_map(|row| project_row(&table, row, &roles))
            .collect();

        Ok(ReadResult {
            items,
            has_threshold_column: roles.threshold.is_some(),
        })
    }

    /// Appends one row. Fails with [`StoreError::Duplicate`] when any
    /// existing row's name is normalization-equivalent to `name`. The
    /// threshold cell is written only when the column exists; remaining
    /// columns are filled by matching `details` keys to headers under
    /// normalization and left blank when unmatched.
    pub async fn add(
        &self,
        name: &str,
        stock: f64,
        threshold: f64,
        details: &BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }

        let _guard = self.acquire().await?;
        let mut table = self.sheet.load()?;
        let roles = detect_columns(&table.headers);

        let exists = table
            .rows
            .iter()
            .any(|row| eq_normalized(table.cell(row, roles.name), name));
        if exists {
            return Err(StoreError::Duplicate);
        }

        let width = table.headers.len();
        let mut row = vec![String::new(); width];
        if roles.name < width {
            row[roles.name] = name.to_string();
        }
        if roles.stock < width {
            row[roles.stock] = format_number(stock);
        }
        if let Some(col) = roles.threshold {
            if col < width {
                row[col] = format_number(threshold);
            }
        }

        for (index, header) in table.headers.iter().enumerate() {
            if index == roles.name || index == roles.stock || roles.threshold == Some(index) {
                continue;
            }
            let wanted = normalize(header);
            if let Some(value) = details
                .iter()
                .find(|(key, _)| normalize(key) == wanted)
                .map(|(_, value)| value)
            {
                row[index] = value_to_cell(value);
            }
        }

        table.rows.push(row);
        self.sheet.save(&table)?;
        tracing::info!(name, stock, "added item");
        Ok(())
    }

    /// Overwrites the stock cell of the first normalization-equivalent row.
    pub async fn update_stock(&self, name: &str, stock: f64) -> Result<(), StoreError> {
        let _guard = self.acquire().await?;
        let mut table = self.sheet.load()?;
        let roles = detect_columns(&table.headers);

        let index = find_row(&table, &roles, name).ok_or(StoreError::NotFound)?;
        table.set_cell(index, roles.stock, format_number(stock));
        self.sheet.save(&table)?;
        tracing::info!(name, stock, "updated stock");
        Ok(())
    }

    /// Overwrites the threshold cell of the first normalization-equivalent
    /// row. Fails with [`StoreError::MissingThresholdColumn`] when the table
    /// has no resolvable threshold column - the caller gets an explicit,
    /// actionable error instead of a silent no-op.
    pub async fn update_threshold(&self, name: &str, threshold: f64) -> Result<(), StoreError> {
        let _guard = self.acquire().await?;
        let mut table = self.sheet.load()?;
        let roles = detect_columns(&table.headers);

        let col = roles.threshold.ok_or(StoreError::MissingThresholdColumn)?;
        let index = find_row(&table, &roles, name).ok_or(StoreError::NotFound)?;
        table.set_cell(index, col, format_number(threshold));
        self.sheet.save(&table)?;
        tracing::info!(name, threshold, "updated threshold");
        Ok(())
    }

    /// Applies free-form cell updates to the first matching row. The literal
    /// key `_newName` rewrites the name cell; every other key resolves to a
    /// header by normalization-equivalence, and keys that match no header
    /// are ignored silently.
    pub async fn update_details(
        &self,
        name: &str,
        updates: &BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        let _guard = self.acquire().await?;
        let mut table = self.sheet.load()?;
        let roles = detect_columns(&table.headers);

        let index = find_row(&table, &roles, name).ok_or(StoreError::NotFound)?;
        for (key, value) in updates {
            if key == "_newName" {
                table.set_cell(index, roles.name, value_to_cell(value));
            } else if let Some(col) = table
                .headers
                .iter()
                .position(|header| eq_normalized(header, key))
            {
                table.set_cell(index, col, value_to_cell(value));
            }
        }
        self.sheet.save(&table)?;
        tracing::info!(name, "updated details");
        Ok(())
    }

    /// Deletes the first row matching `name`: exact normalized equality, or
    /// the near-match fallback (row name contains the target and differs in
    /// length by fewer than 2 chars). The fallback is intentionally
    /// permissive and can remove a near-duplicate row; it is kept as-is
    /// rather than silently tightened.
    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let target = normalize(name);
        if target.is_empty() {
            return Err(StoreError::EmptyName);
        }

        let _guard = self.acquire().await?;
        let mut table = self.sheet.load()?;
        let roles = detect_columns(&table.headers);

        let index = table
            .rows
            .iter()
            .position(|row| {
                let row_name = normalize(table.cell(row, roles.name));
                let length_gap = row_name.chars().count().abs_diff(target.chars().count());
                row_name == target || (row_name.contains(&target) && length_gap < 2)
            })
            .ok_or(StoreError::NotFound)?;

        table.rows.remove(index);
        self.sheet.save(&table)?;
        tracing::info!(name, "deleted item");
        Ok(())
    }

    async fn acquire(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, StoreError> {
        tokio::time::timeout(self.lock_wait, self.guard.lock())
            .await
            .map_err(|_| StoreError::Busy)
    }
}

/// Projects one data row to an [`Item`]. Rows with an empty name cell are
/// dropped (returns `None`).
fn project_row(table: &Table, row: &[String], roles: &ColumnRoles) -> Option<Item> {
    let name = table.cell(row, roles.name).trim();
    if name.is_empty() {
        return None;
    }

    let stock = coerce_number_str(table.cell(row, roles.stock));
    let threshold = roles
        .threshold
        .map(|col| coerce_number_str(table.cell(row, col)))
        .unwrap_or(0.0);

    let mut details = BTreeMap::new();
    for (index, header) in table.headers.iter().enumerate() {
        let key = header.trim();
        if !key.is_empty() {
            details.insert(key.to_string(), cell_to_value(table.cell(row, index)));
        }
    }

    Some(Item::new(name, stock, threshold).with_details(details))
}

/// First row whose name cell is normalization-equivalent to `name`.
fn find_row(table: &Table, roles: &ColumnRoles, name: &str) -> Option<usize> {
    table
        .rows
        .iter()
        .position(|row| eq_normalized(table.cell(row, roles.name), name))
}

/// Renders a number the way it should land in a cell: integral values
/// without the trailing `.0`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const HEADERS: &str = "Référence,Nom,Catégorie,Emplacement,Stock,Seuil";

    fn store_with(contents: &str) -> (tempfile::TempDir, RowStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, RowStore::new(CsvSheet::new(path)))
    }

    #[tokio::test]
    async fn test_read_projects_rows() {
        let (_dir, store) = store_with(&format!(
            "{HEADERS}\nREF-1,Stylo Bleu,Papeterie,Rayon B,10,2\nREF-2,Cahier,Papeterie,Rayon A,3,5\n"
        ));
        let result = store.read().await.unwrap();
        assert!(result.has_threshold_column);
        assert_eq!(result.items.len(), 2);

        let stylo = &result.items[0];
        assert_eq!(stylo.name, "Stylo Bleu");
        assert_eq!(stylo.stock, 10.0);
        assert_eq!(stylo.threshold, 2.0);
        // details carries every column, the structured ones included.
        assert_eq!(stylo.details["Nom"], json!("Stylo Bleu"));
        assert_eq!(stylo.details["Stock"], json!(10.0));
        assert_eq!(stylo.details["Emplacement"], json!("Rayon B"));

        assert!(result.items[1].is_low_stock());
    }

    #[tokio::test]
    async fn test_read_drops_empty_names() {
        let (_dir, store) = store_with(&format!("{HEADERS}\nREF-1,,X,Y,10,2\nREF-2,  ,X,Y,1,0\n"));
        let result = store.read().await.unwrap();
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn test_read_without_threshold_column_degrades() {
        let (_dir, store) = store_with("Nom,Stock\nStylo,4\n");
        let result = store.read().await.unwrap();
        assert!(!result.has_threshold_column);
        assert_eq!(result.items[0].threshold, 0.0);
    }

    #[tokio::test]
    async fn test_add_then_read_roundtrip() {
        let (_dir, store) = store_with(&format!("{HEADERS}\n"));
        let mut details = BTreeMap::new();
        details.insert("emplacement".to_string(), json!("Rayon C"));
        details.insert("Inconnu".to_string(), json!("ignored"));
        store.add("Stylo Bleu", 10.0, 2.0, &details).await.unwrap();

        let result = store.read().await.unwrap();
        assert_eq!(result.items.len(), 1);
        let item = &result.items[0];
        assert_eq!(item.name, "Stylo Bleu");
        assert_eq!(item.stock, 10.0);
        assert_eq!(item.threshold, 2.0);
        // "emplacement" matched the "Emplacement" header under normalization;
        // the unknown key was dropped.
        assert_eq!(item.details["Emplacement"], json!("Rayon C"));
    }

    #[tokio::test]
    async fn test_add_duplicate_identity() {
        let (_dir, store) = store_with(&format!("{HEADERS}\nREF-1,Stylo Bleu,,,10,2\n"));
        let err = store
            .add("  STYLO  bleu ", 1.0, 0.0, &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[tokio::test]
    async fn test_add_rejects_empty_name() {
        let (_dir, store) = store_with(&format!("{HEADERS}\n"));
        let err = store.add("   ", 1.0, 0.0, &BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyName));
    }

    #[tokio::test]
    async fn test_add_without_threshold_column_skips_threshold() {
        let (_dir, store) = store_with("Nom,Stock\n");
        store.add("Stylo", 3.0, 9.0, &BTreeMap::new()).await.unwrap();
        let result = store.read().await.unwrap();
        // The threshold had nowhere to go and reads back as 0.
        assert_eq!(result.items[0].threshold, 0.0);
    }

    #[tokio::test]
    async fn test_update_stock() {
        let (_dir, store) = store_with(&format!("{HEADERS}\nREF-1,Stylo,,,10,2\n"));
        store.update_stock("stylo", 7.0).await.unwrap();
        let result = store.read().await.unwrap();
        assert_eq!(result.items[0].stock, 7.0);

        let err = store.update_stock("Cahier", 1.0).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_update_threshold_requires_column() {
        let (_dir, store) = store_with("Nom,Stock\nStylo,4\n");
        let err = store.update_threshold("Stylo", 2.0).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingThresholdColumn));
        assert!(err.to_string().contains("Seuil"));
    }

    #[tokio::test]
    async fn test_update_threshold() {
        let (_dir, store) = store_with(&format!("{HEADERS}\nREF-1,Stylo,,,10,2\n"));
        store.update_threshold("STYLO", 5.0).await.unwrap();
        let result = store.read().await.unwrap();
        assert_eq!(result.items[0].threshold, 5.0);
    }

    #[tokio::test]
    async fn test_update_details_rename_and_merge() {
        let (_dir, store) = store_with(&format!("{HEADERS}\nREF-1,Stylo,Papeterie,Rayon B,10,2\n"));
        let mut updates = BTreeMap::new();
        updates.insert("_newName".to_string(), json!("Stylo Noir"));
        updates.insert("catégorie".to_string(), json!("Bureau"));
        updates.insert("Colonne Fantôme".to_string(), json!("dropped"));
        store.update_details("Stylo", &updates).await.unwrap();

        let result = store.read().await.unwrap();
        let item = &result.items[0];
        assert_eq!(item.name, "Stylo Noir");
        assert_eq!(item.details["Catégorie"], json!("Bureau"));
        assert_eq!(item.details["Emplacement"], json!("Rayon B"));
    }

    #[tokio::test]
    async fn test_update_details_not_found() {
        let (_dir, store) = store_with(&format!("{HEADERS}\n"));
        let err = store
            .update_details("Stylo", &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_exact() {
        let (_dir, store) = store_with(&format!("{HEADERS}\nREF-1,Stylo,,,10,2\nREF-2,Cahier,,,3,0\n"));
        store.delete("stylo").await.unwrap();
        let result = store.read().await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Cahier");
    }

    #[tokio::test]
    async fn test_delete_near_match_removes_first_row_in_order() {
        // "widgets" contains "widget" and is one char longer: the near-match
        // fallback fires and removes the FIRST matching row, which here is
        // the wrong near-duplicate. Documented sharp edge, kept faithfully.
        let (_dir, store) = store_with(&format!("{HEADERS}\nREF-1,Widgets,,,10,2\nREF-2,Widget,,,3,0\n"));
        store.delete("Widget").await.unwrap();
        let result = store.read().await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Widget");
    }

    #[tokio::test]
    async fn test_delete_near_match_respects_length_gap() {
        // Two chars longer: fallback must not fire.
        let (_dir, store) = store_with(&format!("{HEADERS}\nREF-1,Widgetxx,,,10,2\n"));
        let err = store.delete("Widget").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (_dir, store) = store_with(&format!("{HEADERS}\n"));
        let err = store.delete("Stylo").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_busy_when_guard_held() {
        let (_dir, store) = store_with(&format!("{HEADERS}\n"));
        let store = store.with_lock_wait(Duration::from_millis(20));
        let _held = store.guard.lock().await;
        let err = store.read().await.unwrap_err();
        assert!(matches!(err, StoreError::Busy));
    }
}
