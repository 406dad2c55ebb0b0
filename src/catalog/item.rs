use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

use super::kind::{CatalogKind, KeyType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Text(String),
    Int(i64),
}

impl ItemKey {
    /// Parses user input as the key type the kind expects.
    pub fn parse(kind: CatalogKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match kind.descriptor().key_type {
            KeyType::Text => Some(Self::Text(raw.to_string())),
            KeyType::Integer => raw.parse::<i64>().ok().map(Self::Int),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.is_empty() => Some(Self::Text(text.clone())),
            Value::Number(number) => number.as_i64().map(Self::Int),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Int(id) => Value::from(*id),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(id) => write!(f, "{id}"),
        }
    }
}

/// One backend record together with the kind that describes its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    kind: CatalogKind,
    key: ItemKey,
    record: Map<String, Value>,
}

impl CatalogItem {
    pub fn from_row(kind: CatalogKind, row: Value) -> Option<Self> {
        let Value::Object(record) = row else {
            return None;
        };
        let key = record
            .get(kind.descriptor().key_field)
            .and_then(ItemKey::from_value)?;
        Some(Self { kind, key, record })
    }

    /// Converts a result set, dropping rows without a usable key.
    pub fn from_rows(kind: CatalogKind, rows: Vec<Value>) -> Vec<Self> {
        let total = rows.len();
        let items: Vec<Self> = rows
            .into_iter()
            .filter_map(|row| Self::from_row(kind, row))
            .collect();
        if items.len() < total {
            warn!(
                kind = %kind,
                skipped = total - items.len(),
                "ignored rows without a {} key",
                kind.descriptor().key_field
            );
        }
        items
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn title(&self) -> &str {
        self.record
            .get(self.kind.descriptor().title_field)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn liked(&self) -> bool {
        self.record
            .get("liked")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_liked(&mut self, liked: bool) {
        self.record.insert("liked".to_string(), Value::Bool(liked));
    }

    pub fn category(&self) -> Option<&str> {
        self.record
            .get(self.kind.descriptor().category_field)
            .and_then(Value::as_str)
    }

    /// Trimmed, non-empty category tokens in field order.
    pub fn category_tokens(&self) -> impl Iterator<Item = &str> {
        self.category()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn field_text(&self, field: &str) -> Option<String> {
        match self.record.get(field)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// `needle` must already be lowercase.
    pub(crate) fn matches_text(&self, needle: &str) -> bool {
        if self.title().to_lowercase().contains(needle) {
            return true;
        }
        self.kind
            .descriptor()
            .search_fields
            .iter()
            .filter_map(|field| self.record.get(*field).and_then(Value::as_str))
            .any(|text| text.to_lowercase().contains(needle))
    }
}
