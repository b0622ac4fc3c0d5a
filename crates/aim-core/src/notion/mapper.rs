//! Row mapping
//!
//! Converts one merged-dataset row into a destination property payload.
//! Columns match schema fields by normalized name; unmatched columns and
//! values a field's type cannot represent are omitted, never errors. A row
//! always produces a payload, possibly an empty one.

use serde_json::{json, Map, Value};

use crate::notion::schema::{DatabaseSchema, PropertyKind};
use crate::transform::normalize_column;

/// Build the property payload for one row.
///
/// `cells` must be aligned with `columns`, which is how [`AssetTable`]
/// stores rows. Empty cells are schema-union holes and are skipped.
///
/// [`AssetTable`]: crate::transform::AssetTable
pub fn map_row(columns: &[String], cells: &[String], schema: &DatabaseSchema) -> Map<String, Value> {
    debug_assert_eq!(columns.len(), cells.len());

    let mut properties = Map::new();

    for (column, cell) in columns.iter().zip(cells) {
        if cell.is_empty() {
            continue;
        }

        let Some(field) = schema.get(&normalize_column(column)) else {
            continue;
        };

        if let Some(value) = map_value(&field.kind, cell) {
            properties.insert(field.name.clone(), value);
        }
    }

    properties
}

/// Serialize one cell for a destination field, or `None` to omit the field
fn map_value(kind: &PropertyKind, cell: &str) -> Option<Value> {
    match kind {
        PropertyKind::Title => Some(json!({ "title": [text_fragment(cell)] })),
        PropertyKind::RichText => Some(json!({ "rich_text": [text_fragment(cell)] })),
        PropertyKind::Number => {
            // Cells that do not parse ("N/A", free text) omit the field
            let number = cell.trim().parse::<f64>().ok()?;
            let number = serde_json::Number::from_f64(number)?;
            Some(json!({ "number": number }))
        }
        PropertyKind::Select => Some(json!({ "select": { "name": cell } })),
        PropertyKind::MultiSelect => {
            let options: Vec<Value> = cell
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| json!({ "name": item }))
                .collect();
            Some(json!({ "multi_select": options }))
        }
        // Passed through unvalidated; a value the destination rejects fails
        // that row's create, which the writer logs
        PropertyKind::Date => Some(json!({ "date": { "start": cell } })),
        PropertyKind::Checkbox => Some(json!({ "checkbox": is_truthy(cell) })),
        PropertyKind::Url => Some(json!({ "url": cell })),
        PropertyKind::Email => Some(json!({ "email": cell })),
        PropertyKind::PhoneNumber => Some(json!({ "phone_number": cell })),
        PropertyKind::Unsupported(_) => None,
    }
}

fn text_fragment(content: &str) -> Value {
    json!({ "text": { "content": content } })
}

/// Cells are strings, so plain non-empty truthiness would turn a literal
/// `false` into a checked box.
fn is_truthy(cell: &str) -> bool {
    !matches!(
        cell.to_lowercase().as_str(),
        "" | "false" | "0" | "no" | "off"
    )
}

// ============================================================================
// Tests
// ============================================================================
