//! Recently opened items, kept in local storage and shared with every view
//! that subscribed to updates.

use std::sync::mpsc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{CatalogItem, CatalogKind};
use crate::db::{KeyValueStore, RECENT_ITEMS_KEY};

pub const RECENT_LIMIT: usize = 6;
pub const RECENT_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub id: String,
    pub kind: CatalogKind,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

impl RecentEntry {
    pub fn from_item(item: &CatalogItem, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: item.key().to_string(),
            kind: item.kind(),
            title: item.title().to_string(),
            timestamp,
        }
    }

    fn same_item(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

/// Moves `entry` to the front, dropping any older entry for the same item
/// and anything past [`RECENT_LIMIT`].
pub fn push_visit(entries: &mut Vec<RecentEntry>, entry: RecentEntry) {
    entries.retain(|existing| !existing.same_item(&entry));
    entries.insert(0, entry);
    entries.truncate(RECENT_LIMIT);
}

/// Drops entries older than the retention window ending at `now`.
pub fn prune_expired(entries: &mut Vec<RecentEntry>, now: DateTime<Utc>) {
    let cutoff = now - TimeDelta::days(RECENT_RETENTION_DAYS);
    entries.retain(|entry| entry.timestamp >= cutoff);
}

pub struct RecentTracker<S: KeyValueStore> {
    store: S,
    subscribers: Vec<mpsc::Sender<Vec<RecentEntry>>>,
}

impl<S: KeyValueStore> RecentTracker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            subscribers: Vec::new(),
        }
    }

    /// Every later update is delivered on the returned receiver until it is
    /// dropped.
    pub fn subscribe(&mut self) -> mpsc::Receiver<Vec<RecentEntry>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn load_recent(&self) -> Vec<RecentEntry> {
        self.load_recent_at(Utc::now())
    }

    /// Reads the stored list, prunes expired entries and writes the result
    /// back. Missing or unreadable data reads as an empty list.
    pub fn load_recent_at(&self, now: DateTime<Utc>) -> Vec<RecentEntry> {
        let mut entries = self.read_entries();
        prune_expired(&mut entries, now);
        self.write_entries(&entries);
        entries
    }

    pub fn record_visit(&mut self, item: &CatalogItem) -> Vec<RecentEntry> {
        self.record_visit_at(item, Utc::now())
    }

    pub fn record_visit_at(&mut self, item: &CatalogItem, now: DateTime<Utc>) -> Vec<RecentEntry> {
        let mut entries = self.read_entries();
        prune_expired(&mut entries, now);
        push_visit(&mut entries, RecentEntry::from_item(item, now));
        self.write_entries(&entries);
        self.publish(&entries);
        debug!(kind = %item.kind(), id = %item.key(), len = entries.len(), "recorded visit");
        entries
    }

    fn read_entries(&self) -> Vec<RecentEntry> {
        let raw = match self.store.get(RECENT_ITEMS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("recent items unavailable: {err:#}");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<RecentEntry>>(&raw) {
            Ok(mut entries) => {
                entries.truncate(RECENT_LIMIT);
                entries
            }
            Err(err) => {
                warn!("discarding unreadable recent items: {err}");
                Vec::new()
            }
        }
    }

    fn write_entries(&self, entries: &[RecentEntry]) {
        let raw = match serde_json::to_string(entries) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to encode recent items: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(RECENT_ITEMS_KEY, &raw) {
            warn!("failed to persist recent items: {err:#}");
        }
    }

    fn publish(&mut self, entries: &[RecentEntry]) {
        self.subscribers
            .retain(|subscriber| subscriber.send(entries.to_vec()).is_ok());
    }
}
