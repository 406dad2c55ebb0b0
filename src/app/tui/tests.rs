use std::sync::Arc;
use std::sync::mpsc;

use serde_json::json;

use crate::backend::CatalogBackend;
use crate::backend::memory::MemoryBackend;
use crate::catalog::{CatalogItem, CatalogKind, Dashboard, ItemKey, LoadState, send_like};
use crate::config::AppConfig;
use crate::db::Database;
use crate::recent::RecentTracker;

use super::actions::{drain_backend_events, status_info};
use super::{BackendEvent, HomeState, Screen, TuiApp, TuiContext};

const MOVIES: &str = "Movies_List";

fn memory() -> Arc<MemoryBackend> {
    Arc::new(MemoryBackend::default().with_table(
        MOVIES,
        vec![
            json!({"show_id": "s1", "title": "Heat", "listed_in": "Action", "liked": false}),
            json!({"show_id": "s2", "title": "Amelie", "listed_in": "Comedy", "liked": true}),
        ],
    ))
}

fn movie(id: &str, title: &str) -> CatalogItem {
    CatalogItem::from_row(
        CatalogKind::Movie,
        json!({"show_id": id, "title": title, "liked": false}),
    )
    .expect("movie row")
}

#[test]
fn horizontal_navigation_wraps_at_both_edges() {
    assert_eq!(Screen::Home.move_left(), Screen::Catalog(CatalogKind::Game));
    assert_eq!(Screen::Catalog(CatalogKind::Game).move_right(), Screen::Home);
    assert_eq!(Screen::Home.move_right(), Screen::Catalog(CatalogKind::Movie));
    assert_eq!(Screen::Catalog(CatalogKind::Movie).move_left(), Screen::Home);

    let mut screen = Screen::Home;
    for expected in Screen::ALL.iter().skip(1).chain(Screen::ALL.iter().take(1)) {
        screen = screen.move_right();
        assert_eq!(screen, *expected);
    }
}

#[test]
fn one_visit_reaches_every_mounted_panel() {
    let db = Database::open_in_memory().expect("db");
    let mut tracker = RecentTracker::new(&db);
    let mut app = TuiApp::new(&AppConfig::default(), &mut tracker);
    assert!(app.home_recent.entries.is_empty());

    tracker.record_visit(&movie("s1", "Heat"));
    app.sync_recent();

    assert_eq!(app.home_recent.entries.len(), 1);
    for kind in CatalogKind::ALL {
        let entries = &app.catalog(kind).recent.entries;
        assert_eq!(entries.len(), 1, "{kind} panel");
        assert_eq!(entries[0].title, "Heat");
    }
}

#[test]
fn stale_snapshot_and_dashboard_events_are_ignored() {
    let db = Database::open_in_memory().expect("db");
    let mut tracker = RecentTracker::new(&db);
    let config = AppConfig::default();
    let mut app = TuiApp::new(&config, &mut tracker);
    let backend: Arc<dyn CatalogBackend> = memory();
    let (tx, rx) = mpsc::channel();

    let view = &mut app.catalog_mut(CatalogKind::Movie).view;
    let stale = view.begin_load();
    let current = view.begin_load();
    app.home_generation = 2;

    tx.send(BackendEvent::Snapshot {
        kind: CatalogKind::Movie,
        generation: stale,
        result: Ok(vec![movie("s9", "Old")]),
    })
    .expect("send");
    tx.send(BackendEvent::Dashboard {
        generation: 1,
        result: Ok(Dashboard::default()),
    })
    .expect("send");

    let ctx = TuiContext {
        backend: &backend,
        tx: &tx,
        tracker: &mut tracker,
        tables: &config.tables,
    };
    drain_backend_events(&rx, &mut app, &ctx);

    let view = &app.catalog(CatalogKind::Movie).view;
    assert_eq!(view.state(), &LoadState::Loading);
    assert!(view.items().is_empty());
    assert!(matches!(app.home, HomeState::Loading));

    tx.send(BackendEvent::Snapshot {
        kind: CatalogKind::Movie,
        generation: current,
        result: Ok(vec![movie("s1", "Heat")]),
    })
    .expect("send");
    drain_backend_events(&rx, &mut app, &ctx);

    let view = &app.catalog(CatalogKind::Movie).view;
    assert_eq!(view.state(), &LoadState::Ready);
    assert_eq!(view.items().len(), 1);
}

#[test]
fn failed_like_keeps_item_and_settles_status() {
    let db = Database::open_in_memory().expect("db");
    let mut tracker = RecentTracker::new(&db);
    let config = AppConfig::default();
    let mut app = TuiApp::new(&config, &mut tracker);
    let memory = memory();
    let backend: Arc<dyn CatalogBackend> = memory.clone();
    let (tx, rx) = mpsc::channel();

    let view = &mut app.catalog_mut(CatalogKind::Movie).view;
    view.load(backend.as_ref());
    let key = ItemKey::Text("s1".to_string());
    let request = view.like_request(&key).expect("request");
    assert!(request.liked);

    memory.fail_table(MOVIES);
    let result = send_like(backend.as_ref(), MOVIES, &request);
    assert!(result.is_err());
    app.status = status_info("Liking...");
    tx.send(BackendEvent::Like { request, result }).expect("send");

    let ctx = TuiContext {
        backend: &backend,
        tx: &tx,
        tracker: &mut tracker,
        tables: &config.tables,
    };
    drain_backend_events(&rx, &mut app, &ctx);

    let view = &app.catalog(CatalogKind::Movie).view;
    assert!(!view.find(&key).expect("heat").liked());
    assert_eq!(app.status, status_info("Ready."));
    assert_eq!(memory.rows(MOVIES)[0]["liked"], json!(false));
}

#[test]
fn confirmed_like_updates_snapshot_and_open_detail() {
    let db = Database::open_in_memory().expect("db");
    let mut tracker = RecentTracker::new(&db);
    let config = AppConfig::default();
    let mut app = TuiApp::new(&config, &mut tracker);
    let memory = memory();
    let backend: Arc<dyn CatalogBackend> = memory.clone();
    let (tx, rx) = mpsc::channel();

    let view = &mut app.catalog_mut(CatalogKind::Movie).view;
    view.load(backend.as_ref());
    let key = ItemKey::Text("s1".to_string());
    let request = view.like_request(&key).expect("request");
    let detail = view.find(&key).cloned();
    app.detail = detail;

    let result = send_like(backend.as_ref(), MOVIES, &request);
    tx.send(BackendEvent::Like { request, result }).expect("send");

    let ctx = TuiContext {
        backend: &backend,
        tx: &tx,
        tracker: &mut tracker,
        tables: &config.tables,
    };
    drain_backend_events(&rx, &mut app, &ctx);

    assert!(app.catalog(CatalogKind::Movie).view.find(&key).expect("heat").liked());
    assert!(app.detail.as_ref().expect("detail").liked());
    assert_eq!(app.status, status_info("Liked."));
}
