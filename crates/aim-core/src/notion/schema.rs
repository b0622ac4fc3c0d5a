//! Destination schema resolution
//!
//! The field schema is fetched once per run and resolved into a closed set
//! of property kinds. A declared type the mapper cannot serialize resolves
//! to [`PropertyKind::Unsupported`] and is logged here exactly once, then
//! skipped silently for every row.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::transform::normalize_column;

/// Closed set of destination property types the mapper can serialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Date,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    /// Declared type with no serialization; values are omitted
    Unsupported(String),
}

impl PropertyKind {
    fn from_api(declared: &str) -> Self {
        match declared {
            "title" => PropertyKind::Title,
            "rich_text" => PropertyKind::RichText,
            "number" => PropertyKind::Number,
            "select" => PropertyKind::Select,
            "multi_select" => PropertyKind::MultiSelect,
            "date" => PropertyKind::Date,
            "checkbox" => PropertyKind::Checkbox,
            "url" => PropertyKind::Url,
            "email" => PropertyKind::Email,
            "phone_number" => PropertyKind::PhoneNumber,
            other => PropertyKind::Unsupported(other.to_string()),
        }
    }

    /// Whether the mapper can serialize values of this kind
    pub fn is_supported(&self) -> bool {
        !matches!(self, PropertyKind::Unsupported(_))
    }

    /// The type name as the destination API declares it
    pub fn as_str(&self) -> &str {
        match self {
            PropertyKind::Title => "title",
            PropertyKind::RichText => "rich_text",
            PropertyKind::Number => "number",
            PropertyKind::Select => "select",
            PropertyKind::MultiSelect => "multi_select",
            PropertyKind::Date => "date",
            PropertyKind::Checkbox => "checkbox",
            PropertyKind::Url => "url",
            PropertyKind::Email => "email",
            PropertyKind::PhoneNumber => "phone_number",
            PropertyKind::Unsupported(other) => other,
        }
    }
}

/// One typed field on the destination database
#[derive(Debug, Clone)]
pub struct SchemaField {
    /// Field name exactly as declared; payload keys must use this form
    pub name: String,
    pub kind: PropertyKind,
}

/// Resolved field schema, indexed by normalized field name
#[derive(Debug, Clone, Default)]
pub struct DatabaseSchema {
    fields: Vec<SchemaField>,
    by_normalized: HashMap<String, usize>,
}

impl DatabaseSchema {
    /// Resolve raw property definitions into typed fields.
    ///
    /// Lookup is by normalized name, the same normalization merged columns
    /// get. On a normalized-name collision the first field encountered
    /// wins; field names are unique in practice.
    pub fn resolve(properties: &Map<String, Value>) -> Self {
        let mut schema = DatabaseSchema::default();

        for (name, definition) in properties {
            let declared = definition
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let kind = PropertyKind::from_api(declared);

            if let PropertyKind::Unsupported(unsupported) = &kind {
                warn!(
                    "Property '{}' has unsupported type '{}'; its values will be omitted",
                    name, unsupported
                );
            }

            let index = schema.fields.len();
            schema.fields.push(SchemaField {
                name: name.clone(),
                kind,
            });
            schema
                .by_normalized
                .entry(normalize_column(name))
                .or_insert(index);
        }

        schema
    }

    /// Look up a field by normalized column name
    pub fn get(&self, normalized: &str) -> Option<&SchemaField> {
        self.by_normalized
            .get(normalized)
            .and_then(|&index| self.fields.get(index))
    }

    /// All declared fields in resolution order
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
