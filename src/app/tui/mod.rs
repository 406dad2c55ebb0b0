mod actions;
mod render;
mod session;

#[cfg(test)]
mod tests;

use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use crate::backend::{BackendError, CatalogBackend};
use crate::catalog::{CatalogItem, CatalogKind, CatalogView, Dashboard, FetchError, LikeRequest};
use crate::config::{AppConfig, TableConfig};
use crate::db::{Database, KeyValueStore};
use crate::recent::{RecentEntry, RecentTracker};

use super::{WELCOME_MESSAGE, take_welcome};

use self::actions::{
    Flow, drain_backend_events, handle_key, spawn_dashboard, spawn_snapshot, status_info,
};
use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Home,
    Catalog(CatalogKind),
}

impl Screen {
    pub(crate) const ALL: [Screen; 4] = [
        Self::Home,
        Self::Catalog(CatalogKind::Movie),
        Self::Catalog(CatalogKind::Show),
        Self::Catalog(CatalogKind::Game),
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Home => "HOME",
            Self::Catalog(CatalogKind::Movie) => "MOVIES",
            Self::Catalog(CatalogKind::Show) => "TV SHOWS",
            Self::Catalog(CatalogKind::Game) => "GAMES",
        }
    }

    pub(crate) fn move_right(self) -> Self {
        match self {
            Self::Home => Self::Catalog(CatalogKind::Movie),
            Self::Catalog(CatalogKind::Game) => Self::Home,
            Self::Catalog(kind) => Self::Catalog(kind.next()),
        }
    }

    pub(crate) fn move_left(self) -> Self {
        match self {
            Self::Home => Self::Catalog(CatalogKind::Game),
            Self::Catalog(CatalogKind::Movie) => Self::Home,
            Self::Catalog(CatalogKind::Show) => Self::Catalog(CatalogKind::Movie),
            Self::Catalog(CatalogKind::Game) => Self::Catalog(CatalogKind::Show),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum InputMode {
    Normal,
    Search,
}

#[derive(Debug, Clone)]
pub(super) struct PendingNotice {
    pub(super) title: &'static str,
    pub(super) message: String,
}

#[derive(Debug, Clone)]
pub(super) enum HomeState {
    Loading,
    Ready(Dashboard),
    Failed(String),
}

/// Results coming back from worker threads.
#[derive(Debug)]
pub(super) enum BackendEvent {
    Snapshot {
        kind: CatalogKind,
        generation: u64,
        result: Result<Vec<CatalogItem>, FetchError>,
    },
    Dashboard {
        generation: u64,
        result: Result<Dashboard, FetchError>,
    },
    Like {
        request: LikeRequest,
        result: Result<(), BackendError>,
    },
    Request {
        query: String,
        submitted: bool,
    },
}

/// A mounted screen's copy of the recent list, kept current through its own
/// tracker subscription.
#[derive(Debug)]
pub(super) struct RecentPanel {
    pub(super) entries: Vec<RecentEntry>,
    rx: mpsc::Receiver<Vec<RecentEntry>>,
}

impl RecentPanel {
    fn mount<S: KeyValueStore>(tracker: &mut RecentTracker<S>, initial: &[RecentEntry]) -> Self {
        Self {
            entries: initial.to_vec(),
            rx: tracker.subscribe(),
        }
    }

    fn sync(&mut self) {
        while let Ok(entries) = self.rx.try_recv() {
            self.entries = entries;
        }
    }
}

#[derive(Debug)]
pub(super) struct CatalogScreen {
    pub(super) view: CatalogView,
    pub(super) recent: RecentPanel,
}

pub(super) struct TuiApp {
    pub(super) screen: Screen,
    pub(super) home: HomeState,
    pub(super) home_generation: u64,
    pub(super) home_recent: RecentPanel,
    pub(super) catalogs: Vec<CatalogScreen>,
    pub(super) table_state: TableState,
    pub(super) input: InputMode,
    pub(super) detail: Option<CatalogItem>,
    pub(super) notice: Option<PendingNotice>,
    pub(super) status: String,
}

impl TuiApp {
    pub(super) fn new<S: KeyValueStore>(
        config: &AppConfig,
        tracker: &mut RecentTracker<S>,
    ) -> Self {
        let initial = tracker.load_recent();
        let catalogs = CatalogKind::ALL
            .into_iter()
            .map(|kind| CatalogScreen {
                view: CatalogView::new(
                    kind,
                    config.tables.for_kind(kind),
                    config.views.policy_for(kind),
                ),
                recent: RecentPanel::mount(tracker, &initial),
            })
            .collect();
        Self {
            screen: Screen::Home,
            home: HomeState::Loading,
            home_generation: 0,
            home_recent: RecentPanel::mount(tracker, &initial),
            catalogs,
            table_state: TableState::default(),
            input: InputMode::Normal,
            detail: None,
            notice: None,
            status: status_info("Loading catalogs..."),
        }
    }

    pub(super) fn catalog(&self, kind: CatalogKind) -> &CatalogScreen {
        let idx = CatalogKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
        &self.catalogs[idx]
    }

    pub(super) fn catalog_mut(&mut self, kind: CatalogKind) -> &mut CatalogScreen {
        let idx = CatalogKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
        &mut self.catalogs[idx]
    }

    /// Rows of the current screen, in display order.
    pub(super) fn rows(&self) -> Vec<&CatalogItem> {
        match self.screen {
            Screen::Home => match &self.home {
                HomeState::Ready(dashboard) => dashboard.all_items().collect(),
                HomeState::Loading | HomeState::Failed(_) => Vec::new(),
            },
            Screen::Catalog(kind) => self.catalog(kind).view.visible(),
        }
    }

    pub(super) fn selected_item(&self) -> Option<&CatalogItem> {
        let idx = self.table_state.selected()?;
        self.rows().get(idx).copied()
    }

    pub(super) fn recent_entries(&self) -> &[RecentEntry] {
        match self.screen {
            Screen::Home => &self.home_recent.entries,
            Screen::Catalog(kind) => &self.catalog(kind).recent.entries,
        }
    }

    fn sync_recent(&mut self) {
        self.home_recent.sync();
        for screen in &mut self.catalogs {
            screen.recent.sync();
        }
    }

    /// Keeps the selection inside the current row count.
    pub(super) fn clamp_selection(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        match self.table_state.selected() {
            Some(selected) => self.table_state.select(Some(selected.min(len - 1))),
            None => self.table_state.select(Some(0)),
        }
    }
}

/// Shared handles the key and event handlers need.
pub(super) struct TuiContext<'a, S: KeyValueStore> {
    pub(super) backend: &'a Arc<dyn CatalogBackend>,
    pub(super) tx: &'a mpsc::Sender<BackendEvent>,
    pub(super) tracker: &'a mut RecentTracker<S>,
    pub(super) tables: &'a TableConfig,
}

pub(crate) fn run_tui(
    db: &Database,
    config: &AppConfig,
    backend: Arc<dyn CatalogBackend>,
) -> Result<()> {
    let mut tracker = RecentTracker::new(db);
    let mut app = TuiApp::new(config, &mut tracker);
    if take_welcome(db) {
        app.notice = Some(PendingNotice {
            title: "Welcome",
            message: format!("{WELCOME_MESSAGE}\n\nPress any key to continue."),
        });
    }

    let (tx, rx) = mpsc::channel::<BackendEvent>();
    for kind in CatalogKind::ALL {
        let view = &mut app.catalog_mut(kind).view;
        let generation = view.begin_load();
        spawn_snapshot(&backend, &tx, kind, view.table().to_string(), generation);
    }
    app.home_generation += 1;
    spawn_dashboard(&backend, &tx, &config.tables, app.home_generation);

    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut ctx = TuiContext {
        backend: &backend,
        tx: &tx,
        tracker: &mut tracker,
        tables: &config.tables,
    };

    loop {
        drain_backend_events(&rx, &mut app, &ctx);
        app.sync_recent();
        app.clamp_selection();
        terminal.draw(|frame| draw_tui(frame, &mut app))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if handle_key(&mut app, key, &mut ctx) == Flow::Quit {
            break;
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
