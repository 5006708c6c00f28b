use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One inventory entry, projected from a live table row.
///
/// Items have no identity beyond their `name` (compared in normalized form)
/// and are recomputed fully on every read. `details` maps every column
/// header of the table to the raw cell value, including the columns already
/// surfaced as `name`/`stock`/`threshold` - consumers must not assume the
/// structured fields are excluded from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub name: String,
    /// Coerced on deserialization: numeric strings (with stray whitespace)
    /// are accepted, anything unparseable becomes 0.
    #[serde(deserialize_with = "de_coerced_number")]
    pub stock: f64,
    #[serde(default, deserialize_with = "de_coerced_number")]
    pub threshold: f64,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
}

fn de_coerced_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(crate::normalize::coerce_number(&value))
}

impl Item {
    pub fn new(name: impl Into<String>, stock: f64, threshold: f64) -> Self {
        Self {
            name: name.into(),
            stock,
            threshold,
            details: BTreeMap::new(),
        }
    }

    pub fn with_details(mut self, details: BTreeMap<String, Value>) -> Self {
        self.details = details;
        self
    }

    /// An item is low on stock iff a threshold is configured (> 0) and the
    /// stock has fallen to or below it. Threshold 0 means alerting is
    /// disabled for this item, whatever the stock level.
    pub fn is_low_stock(&self) -> bool {
        self.threshold > 0.0 && self.stock <= self.threshold
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  stock: {}", self.name, self.stock)?;
        if self.threshold > 0.0 {
            write!(f, "  threshold: {}", self.threshold)?;
            if self.is_low_stock() {
                write!(f, "  [LOW]")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_low_stock_predicate() {
        assert!(Item::new("A", 2.0, 5.0).is_low_stock());
        assert!(Item::new("A", 5.0, 5.0).is_low_stock());
        assert!(!Item::new("A", 6.0, 5.0).is_low_stock());
        // Threshold 0 disables alerting entirely.
        assert!(!Item::new("A", 0.0, 0.0).is_low_stock());
        assert!(!Item::new("A", -3.0, 0.0).is_low_stock());
    }

    #[test]
    fn test_item_json_shape() {
        let mut details = BTreeMap::new();
        details.insert("Nom".to_string(), json!("Stylo Bleu"));
        details.insert("Emplacement".to_string(), json!("Rayon B"));
        let item = Item::new("Stylo Bleu", 10.0, 2.0).with_details(details);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"], "Stylo Bleu");
        assert_eq!(json["stock"], 10.0);
        assert_eq!(json["threshold"], 2.0);
        assert_eq!(json["details"]["Emplacement"], "Rayon B");

        let parsed: Item = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_details_field_defaults_empty() {
        let parsed: Item =
            serde_json::from_str(r#"{"name":"X","stock":1,"threshold":0}"#).unwrap();
        assert!(parsed.details.is_empty());
    }

    #[test]
    fn test_numeric_fields_coerced_on_deserialize() {
        let parsed: Item =
            serde_json::from_str(r#"{"name":"X","stock":" 12 ","threshold":""}"#).unwrap();
        assert_eq!(parsed.stock, 12.0);
        assert_eq!(parsed.threshold, 0.0);

        let parsed: Item = serde_json::from_str(r#"{"name":"X","stock":"abc"}"#).unwrap();
        assert_eq!(parsed.stock, 0.0);
        assert_eq!(parsed.threshold, 0.0);
    }

    #[test]
    fn test_display_marks_low_stock() {
        let out = format!("{}", Item::new("Stylo", 1.0, 5.0));
        assert!(out.contains("Stylo"));
        assert!(out.contains("[LOW]"));
        let out = format!("{}", Item::new("Stylo", 9.0, 5.0));
        assert!(!out.contains("[LOW]"));
    }
}
