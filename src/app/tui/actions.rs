use std::sync::Arc;
use std::sync::mpsc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::info;

use crate::backend::CatalogBackend;
use crate::catalog::{
    CatalogKind, Dashboard, ItemKey, LoadState, fetch_snapshot, send_like, submit_request,
};
use crate::config::TableConfig;
use crate::db::KeyValueStore;

use super::super::format::truncate;
use super::{BackendEvent, HomeState, InputMode, Screen, TuiApp, TuiContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    Continue,
    Quit,
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

pub(super) fn spawn_snapshot(
    backend: &Arc<dyn CatalogBackend>,
    tx: &mpsc::Sender<BackendEvent>,
    kind: CatalogKind,
    table: String,
    generation: u64,
) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    std::thread::spawn(move || {
        let result = fetch_snapshot(backend.as_ref(), kind, &table);
        let _ = tx.send(BackendEvent::Snapshot {
            kind,
            generation,
            result,
        });
    });
}

pub(super) fn spawn_dashboard(
    backend: &Arc<dyn CatalogBackend>,
    tx: &mpsc::Sender<BackendEvent>,
    tables: &TableConfig,
    generation: u64,
) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    let tables = tables.clone();
    std::thread::spawn(move || {
        let result = Dashboard::load(backend.as_ref(), &tables);
        let _ = tx.send(BackendEvent::Dashboard { generation, result });
    });
}

pub(super) fn drain_backend_events<S: KeyValueStore>(
    rx: &mpsc::Receiver<BackendEvent>,
    app: &mut TuiApp,
    ctx: &TuiContext<'_, S>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            BackendEvent::Snapshot {
                kind,
                generation,
                result,
            } => {
                let view = &mut app.catalog_mut(kind).view;
                if view.apply_snapshot(generation, result) {
                    app.status = match view.state() {
                        LoadState::Failed(_) => status_error(&format!(
                            "Could not load {}. Press R to retry.",
                            kind.plural()
                        )),
                        _ => status_info(&format!(
                            "Loaded {} {}.",
                            view.items().len(),
                            kind.plural()
                        )),
                    };
                }
            }
            BackendEvent::Dashboard { generation, result } => {
                if generation != app.home_generation {
                    continue;
                }
                app.home = match result {
                    Ok(dashboard) => HomeState::Ready(dashboard),
                    Err(err) => HomeState::Failed(err.to_string()),
                };
            }
            BackendEvent::Like { request, result } => {
                let confirmed = app
                    .catalog_mut(request.kind)
                    .view
                    .finish_like(&request, result);
                if !confirmed {
                    app.status = status_info("Ready.");
                    continue;
                }
                if let Some(detail) = app.detail.as_mut()
                    && detail.kind() == request.kind
                    && detail.key() == &request.key
                {
                    detail.set_liked(request.liked);
                }
                app.status = status_info(if request.liked { "Liked." } else { "Unliked." });
                refresh_home(app, ctx);
            }
            BackendEvent::Request { query, submitted } => {
                if submitted {
                    app.status = status_info(&format!(
                        "Request sent for \"{}\".",
                        truncate(&query, 40)
                    ));
                }
            }
        }
    }
}

pub(super) fn handle_key<S: KeyValueStore>(
    app: &mut TuiApp,
    key: KeyEvent,
    ctx: &mut TuiContext<'_, S>,
) -> Flow {
    if app.notice.is_some() {
        app.notice = None;
        return Flow::Continue;
    }

    if app.detail.is_some() {
        match key.code {
            KeyCode::Char('l') | KeyCode::Char(' ') => {
                if let Some(item) = app.detail.as_ref() {
                    let (kind, key) = (item.kind(), item.key().clone());
                    start_like(app, ctx, kind, &key);
                }
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.detail = None,
            _ => {}
        }
        return Flow::Continue;
    }

    if app.input == InputMode::Search {
        handle_search_key(app, key);
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Tab | KeyCode::Right => switch_screen(app, app.screen.move_right()),
        KeyCode::BackTab | KeyCode::Left => switch_screen(app, app.screen.move_left()),
        KeyCode::Up => {
            if let Some(selected) = app.table_state.selected() {
                app.table_state.select(Some(selected.saturating_sub(1)));
            }
        }
        KeyCode::Down => {
            let len = app.rows().len();
            if let Some(selected) = app.table_state.selected()
                && len > 0
            {
                app.table_state.select(Some((selected + 1).min(len - 1)));
            }
        }
        KeyCode::Char('/') => {
            if matches!(app.screen, Screen::Catalog(_)) {
                app.input = InputMode::Search;
                app.status = status_info("Type to search. Enter/Esc to finish.");
            }
        }
        KeyCode::Enter => open_selected(app, ctx),
        KeyCode::Char('l') | KeyCode::Char(' ') => {
            let Some(item) = app.selected_item() else {
                app.status = status_error("Nothing selected.");
                return Flow::Continue;
            };
            let (kind, key) = (item.kind(), item.key().clone());
            start_like(app, ctx, kind, &key);
        }
        KeyCode::Char('f') => {
            if let Screen::Catalog(kind) = app.screen {
                let filter = &mut app.catalog_mut(kind).view.filter;
                filter.liked_only = !filter.liked_only;
                app.table_state.select(Some(0));
            }
        }
        KeyCode::Char('c') => {
            if let Screen::Catalog(kind) = app.screen {
                app.catalog_mut(kind).view.cycle_category();
                app.table_state.select(Some(0));
            }
        }
        KeyCode::Char('x') => {
            if let Screen::Catalog(kind) = app.screen {
                let view = &mut app.catalog_mut(kind).view;
                view.filter = Default::default();
                app.table_state.select(Some(0));
                app.status = status_info("Filters cleared.");
            }
        }
        KeyCode::Char('r') => request_missing(app, ctx),
        KeyCode::Char('R') => reload_current(app, ctx),
        _ => {}
    }
    Flow::Continue
}

fn handle_search_key(app: &mut TuiApp, key: KeyEvent) {
    let Screen::Catalog(kind) = app.screen else {
        app.input = InputMode::Normal;
        return;
    };
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
        app.input = InputMode::Normal;
        app.status = status_info("Ready.");
        return;
    }
    let query = &mut app.catalog_mut(kind).view.filter.query;
    match key.code {
        KeyCode::Backspace => {
            query.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => query.clear(),
        KeyCode::Char(c) => query.push(c),
        _ => {}
    }
    app.table_state.select(Some(0));
}

fn switch_screen(app: &mut TuiApp, screen: Screen) {
    app.screen = screen;
    app.table_state.select(Some(0));
    app.status = status_info(screen_hint(screen));
}

fn screen_hint(screen: Screen) -> &'static str {
    match screen {
        Screen::Home => "Your liked items and recently viewed.",
        Screen::Catalog(_) => "/ search  f liked only  c category  x clear  r request",
    }
}

fn open_selected<S: KeyValueStore>(app: &mut TuiApp, ctx: &mut TuiContext<'_, S>) {
    let Some(item) = app.selected_item().cloned() else {
        return;
    };
    ctx.tracker.record_visit(&item);
    app.detail = Some(item);
}

fn start_like<S: KeyValueStore>(
    app: &mut TuiApp,
    ctx: &TuiContext<'_, S>,
    kind: CatalogKind,
    key: &ItemKey,
) {
    let view = &app.catalog(kind).view;
    let Some(request) = view.like_request(key) else {
        app.status = status_error(&format!("{} are not loaded yet.", kind.plural()));
        return;
    };
    let table = view.table().to_string();
    let backend = Arc::clone(ctx.backend);
    let tx = ctx.tx.clone();
    app.status = status_info(if request.liked { "Liking..." } else { "Unliking..." });
    std::thread::spawn(move || {
        let result = send_like(backend.as_ref(), &table, &request);
        let _ = tx.send(BackendEvent::Like { request, result });
    });
}

fn request_missing<S: KeyValueStore>(app: &mut TuiApp, ctx: &TuiContext<'_, S>) {
    let Screen::Catalog(kind) = app.screen else {
        return;
    };
    let query = app.catalog(kind).view.filter.query.trim().to_string();
    if query.is_empty() {
        app.status = status_error("Type a search first, then press r to request it.");
        return;
    }
    let backend = Arc::clone(ctx.backend);
    let tx = ctx.tx.clone();
    let table = ctx.tables.requests.clone();
    info!(query = %query, kind = %kind, "queueing request");
    std::thread::spawn(move || {
        let submitted = submit_request(backend.as_ref(), &table, Some(kind), &query);
        let _ = tx.send(BackendEvent::Request { query, submitted });
    });
}

fn reload_current<S: KeyValueStore>(app: &mut TuiApp, ctx: &TuiContext<'_, S>) {
    match app.screen {
        Screen::Home => refresh_home(app, ctx),
        Screen::Catalog(kind) => {
            let view = &mut app.catalog_mut(kind).view;
            let generation = view.begin_load();
            let table = view.table().to_string();
            spawn_snapshot(ctx.backend, ctx.tx, kind, table, generation);
            app.status = status_info(&format!("Reloading {}...", kind.plural()));
        }
    }
}

fn refresh_home<S: KeyValueStore>(app: &mut TuiApp, ctx: &TuiContext<'_, S>) {
    app.home_generation += 1;
    if matches!(app.home, HomeState::Failed(_)) {
        app.home = HomeState::Loading;
    }
    spawn_dashboard(ctx.backend, ctx.tx, ctx.tables, app.home_generation);
}
