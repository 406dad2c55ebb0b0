use serde_json::Value;
use tracing::error;

use crate::backend::CatalogBackend;
use crate::config::TableConfig;

use super::{CatalogItem, CatalogKind, FetchError};

/// Liked items of every kind, as shown on the home screen.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub sections: Vec<(CatalogKind, Vec<CatalogItem>)>,
}

impl Dashboard {
    /// Fetches movies, shows and games in that order; the first failure
    /// aborts the whole dashboard.
    pub fn load(backend: &dyn CatalogBackend, tables: &TableConfig) -> Result<Self, FetchError> {
        let mut sections = Vec::with_capacity(CatalogKind::ALL.len());
        for kind in CatalogKind::ALL {
            let rows = backend
                .select_eq(tables.for_kind(kind), "liked", &Value::Bool(true))
                .map_err(|source| {
                    error!(kind = %kind, "liked fetch failed: {source}");
                    FetchError { kind, source }
                })?;
            sections.push((kind, CatalogItem::from_rows(kind, rows)));
        }
        Ok(Self { sections })
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|(_, items)| items.is_empty())
    }

    pub fn items(&self, kind: CatalogKind) -> &[CatalogItem] {
        self.sections
            .iter()
            .find(|(section, _)| *section == kind)
            .map(|(_, items)| items.as_slice())
            .unwrap_or(&[])
    }

    /// Every liked item, section by section.
    pub fn all_items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.sections.iter().flat_map(|(_, items)| items.iter())
    }
}
