use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogKind, EmptyQueryPolicy};

pub const BACKEND_URL_ENV: &str = "OMNIA_BACKEND_URL";
pub const API_KEY_ENV: &str = "OMNIA_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub tables: TableConfig,
    pub views: ViewConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            connect_timeout_ms: 3_000,
            read_timeout_ms: 10_000,
        }
    }
}

impl BackendConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub movies: String,
    pub shows: String,
    pub games: String,
    pub requests: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            movies: "Movies_List".to_string(),
            shows: "TV_Shows".to_string(),
            games: "Video_Game".to_string(),
            requests: "requests".to_string(),
        }
    }
}

impl TableConfig {
    pub fn for_kind(&self, kind: CatalogKind) -> &str {
        match kind {
            CatalogKind::Movie => &self.movies,
            CatalogKind::Show => &self.shows,
            CatalogKind::Game => &self.games,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub movies: EmptyQueryPolicy,
    pub shows: EmptyQueryPolicy,
    pub games: EmptyQueryPolicy,
}

impl ViewConfig {
    pub fn policy_for(&self, kind: CatalogKind) -> EmptyQueryPolicy {
        match kind {
            CatalogKind::Movie => self.movies,
            CatalogKind::Show => self.shows,
            CatalogKind::Game => self.games,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,ureq=warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the config file when present, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            Self::parse(&raw)
                .with_context(|| format!("failed to parse config at {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config at {}", path.display()))?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend.url = url;
        }
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend.api_key = key;
        }
    }
}
