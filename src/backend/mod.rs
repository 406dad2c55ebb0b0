//! Access to the hosted table API that owns all catalog data.
//!
//! The app only ever needs four operations per table, so the seam is a small
//! synchronous trait. [`RestBackend`] speaks the PostgREST dialect used by
//! Supabase projects; tests swap in an in-memory table set.

#[cfg(test)]
pub(crate) mod memory;
mod rest;

use serde_json::Value;
use thiserror::Error;

pub use rest::RestBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend url is not configured (set [backend].url or OMNIA_BACKEND_URL)")]
    NotConfigured,
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("no row in {table} matched {column} = {value}")]
    NoMatch {
        table: String,
        column: String,
        value: String,
    },
}

/// Table-oriented data API. Every call returns the affected rows as JSON
/// objects, in backend order.
pub trait CatalogBackend: Send + Sync {
    fn select_all(&self, table: &str) -> Result<Vec<Value>, BackendError>;

    fn select_eq(&self, table: &str, column: &str, value: &Value)
    -> Result<Vec<Value>, BackendError>;

    /// Point update of the rows whose `key_column` equals `key`.
    fn update(
        &self,
        table: &str,
        key_column: &str,
        key: &Value,
        patch: &Value,
    ) -> Result<Vec<Value>, BackendError>;

    fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, BackendError>;
}

/// Renders a scalar as it appears in an equality filter (`col=eq.<value>`).
pub(crate) fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
