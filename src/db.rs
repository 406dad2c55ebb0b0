use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

pub const WELCOME_SEEN_KEY: &str = "has_seen_welcome";
pub const RECENT_ITEMS_KEY: &str = "recent_items";

/// Durable string key/value storage owned by the client.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory().context("failed to open in-memory database")?,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn has_seen_welcome(&self) -> Result<bool> {
        Ok(self.get(WELCOME_SEEN_KEY)?.as_deref() == Some("true"))
    }

    pub fn mark_welcome_seen(&self) -> Result<()> {
        self.set(WELCOME_SEEN_KEY, "true")
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_state WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to read local state key {key}"))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                r#"
                INSERT INTO local_state (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![key, value, now],
            )
            .with_context(|| format!("failed to write local state key {key}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let db = Database::open_in_memory().expect("open db");
        assert_eq!(db.get("nope").expect("read"), None);
    }

    #[test]
    fn set_overwrites_previous_value() {
        let db = Database::open_in_memory().expect("open db");
        db.set("k", "one").expect("first write");
        db.set("k", "two").expect("second write");
        assert_eq!(db.get("k").expect("read").as_deref(), Some("two"));
    }

    #[test]
    fn welcome_flag_is_set_once() {
        let db = Database::open_in_memory().expect("open db");
        assert!(!db.has_seen_welcome().expect("read flag"));
        db.mark_welcome_seen().expect("set flag");
        assert!(db.has_seen_welcome().expect("read flag"));
    }

    #[test]
    fn database_file_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("omnia.db");
        {
            let db = Database::open(&path).expect("open");
            db.migrate().expect("migrate");
            db.set(RECENT_ITEMS_KEY, "[]").expect("write");
        }
        let db = Database::open(&path).expect("reopen");
        db.migrate().expect("migrate again");
        assert_eq!(db.get(RECENT_ITEMS_KEY).expect("read").as_deref(), Some("[]"));
    }
}
