use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::backend::{BackendError, CatalogBackend};

use super::filter::{Filter, extract_categories, filter_items, group_by_initial};
use super::{CatalogItem, CatalogKind, EmptyQueryPolicy, FetchError, ItemKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// A point update waiting to be sent: set `liked` on `key` to `liked`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRequest {
    pub kind: CatalogKind,
    pub key: ItemKey,
    pub liked: bool,
}

/// In-memory snapshot of one catalog table plus the user's filter.
#[derive(Debug, Clone)]
pub struct CatalogView {
    kind: CatalogKind,
    table: String,
    policy: EmptyQueryPolicy,
    items: Vec<CatalogItem>,
    state: LoadState,
    generation: u64,
    pub filter: Filter,
}

impl CatalogView {
    pub fn new(kind: CatalogKind, table: impl Into<String>, policy: EmptyQueryPolicy) -> Self {
        Self {
            kind,
            table: table.into(),
            policy,
            items: Vec::new(),
            state: LoadState::Loading,
            generation: 0,
            filter: Filter::default(),
        }
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn policy(&self) -> EmptyQueryPolicy {
        self.policy
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Marks the view as loading and returns the generation a snapshot must
    /// carry to be accepted.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.state = LoadState::Loading;
        self.generation
    }

    /// Stores a snapshot result. Results from an older load are discarded.
    pub fn apply_snapshot(
        &mut self,
        generation: u64,
        result: Result<Vec<CatalogItem>, FetchError>,
    ) -> bool {
        if generation != self.generation {
            info!(
                kind = %self.kind,
                generation,
                current = self.generation,
                "dropped stale snapshot"
            );
            return false;
        }
        match result {
            Ok(items) => {
                self.items = items;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                error!(kind = %self.kind, "{err}");
                self.state = LoadState::Failed(err.to_string());
            }
        }
        true
    }

    pub fn load(&mut self, backend: &dyn CatalogBackend) -> &LoadState {
        let generation = self.begin_load();
        let result = fetch_snapshot(backend, self.kind, &self.table);
        self.apply_snapshot(generation, result);
        &self.state
    }

    pub fn visible(&self) -> Vec<&CatalogItem> {
        filter_items(&self.items, &self.filter, self.policy)
    }

    pub fn categories(&self) -> BTreeSet<String> {
        extract_categories(&self.items)
    }

    pub fn category_groups(&self) -> BTreeMap<char, Vec<String>> {
        group_by_initial(self.categories().iter().map(String::as_str))
    }

    /// Moves the category filter to the next known category, wrapping back
    /// to "no category" after the last one.
    pub fn cycle_category(&mut self) {
        let categories = self.categories();
        self.filter.category = match self.filter.category.as_deref() {
            None => categories.into_iter().next(),
            Some(current) => categories
                .range::<str, _>((
                    std::ops::Bound::Excluded(current),
                    std::ops::Bound::Unbounded,
                ))
                .next()
                .cloned(),
        };
    }

    pub fn find(&self, key: &ItemKey) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.key() == key)
    }

    /// Builds the inverted-like update for `key`; a missing item is logged.
    pub fn like_request(&self, key: &ItemKey) -> Option<LikeRequest> {
        let Some(item) = self.find(key) else {
            error!(kind = %self.kind, %key, "like toggle for unknown item");
            return None;
        };
        info!(kind = %self.kind, %key, current = item.liked(), "toggling like");
        Some(LikeRequest {
            kind: self.kind,
            key: key.clone(),
            liked: !item.liked(),
        })
    }

    /// Applies a confirmed update; on failure only logs, leaving the
    /// snapshot as it was.
    pub fn finish_like(
        &mut self,
        request: &LikeRequest,
        result: Result<(), BackendError>,
    ) -> bool {
        if let Err(err) = result {
            error!(kind = %self.kind, key = %request.key, "like update failed: {err}");
            return false;
        }
        match self.items.iter_mut().find(|item| item.key() == &request.key) {
            Some(item) => {
                item.set_liked(request.liked);
                true
            }
            None => {
                warn!(kind = %self.kind, key = %request.key, "liked item left the snapshot");
                false
            }
        }
    }

    /// Returns the new `liked` value when the backend confirmed the change.
    pub fn toggle_like(&mut self, backend: &dyn CatalogBackend, key: &ItemKey) -> Option<bool> {
        let request = self.like_request(key)?;
        let result = send_like(backend, &self.table, &request);
        self.finish_like(&request, result).then_some(request.liked)
    }

    /// Inserts `record` and appends what the backend stored.
    pub fn add_item(
        &mut self,
        backend: &dyn CatalogBackend,
        record: Value,
    ) -> Option<&CatalogItem> {
        let rows = match backend.insert(&self.table, &[record]) {
            Ok(rows) => rows,
            Err(err) => {
                error!(kind = %self.kind, "adding item failed: {err}");
                return None;
            }
        };
        let added = CatalogItem::from_rows(self.kind, rows);
        let count = added.len();
        self.items.extend(added);
        if count == 0 {
            warn!(kind = %self.kind, "insert returned no usable row");
            return None;
        }
        self.items.last()
    }
}

pub fn fetch_snapshot(
    backend: &dyn CatalogBackend,
    kind: CatalogKind,
    table: &str,
) -> Result<Vec<CatalogItem>, FetchError> {
    let rows = backend
        .select_all(table)
        .map_err(|source| FetchError { kind, source })?;
    Ok(CatalogItem::from_rows(kind, rows))
}

pub fn send_like(
    backend: &dyn CatalogBackend,
    table: &str,
    request: &LikeRequest,
) -> Result<(), BackendError> {
    backend
        .update(
            table,
            request.kind.descriptor().key_field,
            &request.key.to_value(),
            &json!({ "liked": request.liked }),
        )
        .map(|_| ())
}

/// Files an unmet search in the requests table. Failures are logged only.
pub fn submit_request(
    backend: &dyn CatalogBackend,
    table: &str,
    kind: Option<CatalogKind>,
    query: &str,
) -> bool {
    let query = query.trim();
    if query.is_empty() {
        warn!("ignored empty request");
        return false;
    }
    let row = json!({
        "query": query,
        "kind": kind.map(CatalogKind::as_str),
    });
    match backend.insert(table, &[row]) {
        Ok(_) => {
            info!(query, "submitted request");
            true
        }
        Err(err) => {
            error!(query, "request submission failed: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    const TABLE: &str = "Movies_List";

    fn backend() -> MemoryBackend {
        MemoryBackend::default().with_table(
            TABLE,
            vec![
                json!({"show_id": "s1", "title": "Heat", "listed_in": "Action, Crime", "liked": false}),
                json!({"show_id": "s2", "title": "Amelie", "listed_in": "Comedy", "liked": true}),
            ],
        )
    }

    fn loaded_view(backend: &MemoryBackend) -> CatalogView {
        let mut view = CatalogView::new(CatalogKind::Movie, TABLE, EmptyQueryPolicy::ShowAll);
        assert_eq!(view.load(backend), &LoadState::Ready);
        view
    }

    fn key(id: &str) -> ItemKey {
        ItemKey::Text(id.to_string())
    }

    #[test]
    fn load_failure_blocks_the_view_with_message() {
        let backend = backend();
        backend.fail_table(TABLE);
        let mut view = CatalogView::new(CatalogKind::Movie, TABLE, EmptyQueryPolicy::ShowAll);

        let state = view.load(&backend).clone();

        match state {
            LoadState::Failed(message) => {
                assert!(message.contains("failed to fetch movies"), "message: {message}");
                assert!(message.contains("unavailable"), "message: {message}");
            }
            other => panic!("unexpected state: {other:?}"),
        }
        assert!(view.items().is_empty());
    }

    #[test]
    fn stale_snapshot_is_discarded() {
        let mut view = CatalogView::new(CatalogKind::Movie, TABLE, EmptyQueryPolicy::ShowAll);
        let first = view.begin_load();
        let second = view.begin_load();

        assert!(!view.apply_snapshot(first, Ok(Vec::new())));
        assert_eq!(view.state(), &LoadState::Loading);
        assert!(view.apply_snapshot(second, Ok(Vec::new())));
        assert_eq!(view.state(), &LoadState::Ready);
    }

    #[test]
    fn toggle_then_refetch_shows_inverted_value() {
        let backend = backend();
        let mut view = loaded_view(&backend);

        assert_eq!(view.toggle_like(&backend, &key("s1")), Some(true));
        assert!(view.find(&key("s1")).expect("s1").liked());

        let mut fresh = loaded_view(&backend);
        assert!(fresh.find(&key("s1")).expect("s1").liked());

        assert_eq!(fresh.toggle_like(&backend, &key("s1")), Some(false));
        let again = loaded_view(&backend);
        assert!(!again.find(&key("s1")).expect("s1").liked());
    }

    #[test]
    fn failed_update_leaves_snapshot_untouched() {
        let backend = backend();
        let mut view = loaded_view(&backend);
        backend.fail_table(TABLE);

        assert_eq!(view.toggle_like(&backend, &key("s2")), None);
        assert!(view.find(&key("s2")).expect("s2").liked());

        backend.heal_table(TABLE);
        assert_eq!(view.toggle_like(&backend, &key("s2")), Some(false));
    }

    #[test]
    fn unknown_item_sends_nothing() {
        let backend = backend();
        let mut view = loaded_view(&backend);
        assert_eq!(view.toggle_like(&backend, &key("missing")), None);
        assert_eq!(backend.rows(TABLE).len(), 2);
    }

    #[test]
    fn cycle_category_walks_sorted_categories_then_clears() {
        let backend = backend();
        let mut view = loaded_view(&backend);
        let mut seen = Vec::new();
        for _ in 0..4 {
            view.cycle_category();
            seen.push(view.filter.category.clone());
        }
        assert_eq!(
            seen,
            vec![
                Some("Action".to_string()),
                Some("Comedy".to_string()),
                Some("Crime".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn add_item_appends_stored_row() {
        let backend = backend();
        let mut view = loaded_view(&backend);
        let record = CatalogKind::Movie.descriptor().new_record(
            Some(&key("s3")),
            "Ran",
            "Kurosawa epic",
        );

        let added_title = view
            .add_item(&backend, record)
            .expect("added")
            .title()
            .to_string();

        assert_eq!(added_title, "Ran");
        assert_eq!(view.items().len(), 3);
        assert_eq!(backend.rows(TABLE).len(), 3);
    }

    #[test]
    fn add_item_failure_is_swallowed() {
        let backend = backend();
        let mut view = loaded_view(&backend);
        backend.fail_table(TABLE);
        let record = CatalogKind::Movie.descriptor().new_record(None, "Ran", "");
        assert!(view.add_item(&backend, record).is_none());
        assert_eq!(view.items().len(), 2);
    }

    #[test]
    fn request_submission_records_query_and_kind() {
        let backend = MemoryBackend::default();
        assert!(submit_request(&backend, "requests", Some(CatalogKind::Game), " Okami "));
        assert!(!submit_request(&backend, "requests", None, "   "));
        assert_eq!(
            backend.rows("requests"),
            vec![json!({"query": "Okami", "kind": "game"})]
        );

        backend.fail_table("requests");
        assert!(!submit_request(&backend, "requests", None, "Dune"));
    }
}
