use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::{BackendError, CatalogBackend, filter_literal};

const REST_PREFIX: &str = "/rest/v1";

#[derive(Debug, Clone)]
pub struct RestBackend {
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
}

impl RestBackend {
    pub fn new(
        base_url: &str,
        api_key: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(BackendError::NotConfigured);
        }
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .timeout_write(read_timeout)
            .build();
        Ok(Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            agent,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}{REST_PREFIX}/{table}", self.base_url)
    }

    fn request(&self, method: &str, table: &str) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, &self.table_url(table))
            .set("Accept", "application/json");
        if !self.api_key.is_empty() {
            request = request
                .set("apikey", &self.api_key)
                .set("Authorization", &format!("Bearer {}", self.api_key));
        }
        request
    }
}

impl CatalogBackend for RestBackend {
    fn select_all(&self, table: &str) -> Result<Vec<Value>, BackendError> {
        debug!(table, "select all");
        let request = self.request("GET", table).query("select", "*");
        read_rows(request.call())
    }

    fn select_eq(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<Vec<Value>, BackendError> {
        debug!(table, column, %value, "select by equality");
        let request = self
            .request("GET", table)
            .query("select", "*")
            .query(column, &format!("eq.{}", filter_literal(value)));
        read_rows(request.call())
    }

    fn update(
        &self,
        table: &str,
        key_column: &str,
        key: &Value,
        patch: &Value,
    ) -> Result<Vec<Value>, BackendError> {
        debug!(table, key_column, %key, %patch, "point update");
        let request = self
            .request("PATCH", table)
            .query(key_column, &format!("eq.{}", filter_literal(key)))
            .set("Content-Type", "application/json")
            .set("Prefer", "return=representation");
        let rows = read_rows(request.send_string(&patch.to_string()))?;
        if rows.is_empty() {
            return Err(BackendError::NoMatch {
                table: table.to_string(),
                column: key_column.to_string(),
                value: filter_literal(key),
            });
        }
        Ok(rows)
    }

    fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, BackendError> {
        debug!(table, count = rows.len(), "insert");
        let body = Value::Array(rows.to_vec()).to_string();
        let request = self
            .request("POST", table)
            .set("Content-Type", "application/json")
            .set("Prefer", "return=representation");
        read_rows(request.send_string(&body))
    }
}

fn read_rows(result: Result<ureq::Response, ureq::Error>) -> Result<Vec<Value>, BackendError> {
    match result {
        Ok(response) => {
            let body = response
                .into_string()
                .map_err(|err| BackendError::Decode(format!("response read failed: {err}")))?;
            parse_rows(&body)
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().ok().unwrap_or_default();
            Err(BackendError::Status {
                status,
                message: error_message(&body),
            })
        }
        Err(ureq::Error::Transport(err)) => Err(BackendError::Transport(err.to_string())),
    }
}

fn parse_rows(body: &str) -> Result<Vec<Value>, BackendError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(Value::Object(row)) => Ok(vec![Value::Object(row)]),
        Ok(other) => Err(BackendError::Decode(format!(
            "expected a JSON array of rows, got {other}"
        ))),
        Err(err) => Err(BackendError::Decode(err.to_string())),
    }
}

/// PostgREST puts the human readable cause in `message`; anything else is
/// passed through truncated.
fn error_message(body: &str) -> String {
    let body = body.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body)
        && let Some(Value::String(message)) = map.get("message")
    {
        return message.clone();
    }
    if body.is_empty() {
        return "empty response body".to_string();
    }
    body.chars().take(240).collect()
}
