use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use serde_json::Value;

use super::{BackendError, CatalogBackend, filter_literal};

/// Table set kept in memory; tables named in `failing` reject every call.
#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    tables: Mutex<BTreeMap<String, Vec<Value>>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryBackend {
    pub(crate) fn with_table(self, table: &str, rows: Vec<Value>) -> Self {
        self.tables
            .lock()
            .expect("lock tables")
            .insert(table.to_string(), rows);
        self
    }

    pub(crate) fn fail_table(&self, table: &str) {
        self.failing
            .lock()
            .expect("lock failing")
            .insert(table.to_string());
    }

    pub(crate) fn heal_table(&self, table: &str) {
        self.failing.lock().expect("lock failing").remove(table);
    }

    pub(crate) fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .expect("lock tables")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self, table: &str) -> Result<(), BackendError> {
        if self.failing.lock().expect("lock failing").contains(table) {
            return Err(BackendError::Status {
                status: 503,
                message: format!("{table} unavailable"),
            });
        }
        Ok(())
    }
}

impl CatalogBackend for MemoryBackend {
    fn select_all(&self, table: &str) -> Result<Vec<Value>, BackendError> {
        self.check(table)?;
        Ok(self.rows(table))
    }

    fn select_eq(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<Vec<Value>, BackendError> {
        self.check(table)?;
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| row.get(column) == Some(value))
            .collect())
    }

    fn update(
        &self,
        table: &str,
        key_column: &str,
        key: &Value,
        patch: &Value,
    ) -> Result<Vec<Value>, BackendError> {
        self.check(table)?;
        let mut tables = self.tables.lock().expect("lock tables");
        let rows = tables.entry(table.to_string()).or_default();
        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if row.get(key_column) != Some(key) {
                continue;
            }
            if let (Value::Object(target), Value::Object(changes)) = (&mut *row, patch) {
                for (field, value) in changes {
                    target.insert(field.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        if updated.is_empty() {
            return Err(BackendError::NoMatch {
                table: table.to_string(),
                column: key_column.to_string(),
                value: filter_literal(key),
            });
        }
        Ok(updated)
    }

    fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, BackendError> {
        self.check(table)?;
        self.tables
            .lock()
            .expect("lock tables")
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows.to_vec())
    }
}
