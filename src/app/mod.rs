mod format;
mod tui;


use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use tracing::warn;

use crate::backend::{CatalogBackend, RestBackend};
use crate::catalog::{
    CatalogItem, CatalogKind, CatalogView, Dashboard, ItemKey, LoadState, submit_request,
};
use crate::cli::{AddArgs, BrowseArgs, Cli, Command};
use crate::config::AppConfig;
use crate::db::Database;
use crate::paths::database_file_path;
use crate::recent::{RecentEntry, RecentTracker};

use self::format::{
    category_group_lines, detail_lines, format_seen_at, liked_marker, summary_text, truncate,
};

pub(crate) const WELCOME_MESSAGE: &str = "Welcome to omnia. Browse movies, TV shows and video \
games, like what you enjoy, and request anything that is missing.";

pub fn run(cli: Cli, config: AppConfig, config_path: &Path) -> Result<()> {
    let command = cli.command.unwrap_or(Command::Tui);
    if let Command::Config { write } = command {
        return run_config(&config, config_path, write);
    }

    let db = open_db()?;
    if !matches!(command, Command::Tui) && take_welcome(&db) {
        eprintln!("{WELCOME_MESSAGE}\n");
    }
    run_command(command, &config, &db)
}

/// Runs one non-config command. The backend is only contacted by commands
/// that read or write catalog tables.
pub(crate) fn run_command(command: Command, config: &AppConfig, db: &Database) -> Result<()> {
    match command {
        Command::Recent => run_recent(db),
        Command::Tui => tui::run_tui(db, config, Arc::new(connect(config)?))?,
        Command::Home => run_home(db, &connect(config)?, config)?,
        Command::Browse(args) => run_browse(&connect(config)?, config, args)?,
        Command::Categories { kind } => run_categories(&connect(config)?, config, kind.into())?,
        Command::Open { kind, id } => run_open(db, &connect(config)?, config, kind.into(), &id)?,
        Command::Like { kind, id } => run_like(&connect(config)?, config, kind.into(), &id)?,
        Command::Request { text, kind } => {
            run_request(&connect(config)?, config, &text, kind.map(Into::into))?
        }
        Command::Add(args) => run_add(&connect(config)?, config, args)?,
        Command::Config { .. } => {}
    }

    Ok(())
}

/// True exactly once per local database. A storage failure counts as
/// already seen so the notice never nags.
pub(crate) fn take_welcome(db: &Database) -> bool {
    match db.has_seen_welcome() {
        Ok(true) => false,
        Ok(false) => {
            if let Err(err) = db.mark_welcome_seen() {
                warn!("failed to store welcome flag: {err:#}");
            }
            true
        }
        Err(err) => {
            warn!("failed to read welcome flag: {err:#}");
            false
        }
    }
}

fn run_home(db: &Database, backend: &dyn CatalogBackend, config: &AppConfig) -> Result<()> {
    let dashboard = Dashboard::load(backend, &config.tables)?;
    if dashboard.is_empty() {
        println!("Nothing liked yet. Run `omnia browse <kind>` and `omnia like` to add some.");
    }
    for kind in CatalogKind::ALL {
        let items = dashboard.items(kind);
        if items.is_empty() {
            continue;
        }
        println!("Liked {}:", kind.plural());
        for item in items {
            println!("  {:<24} {}", truncate(&item.key().to_string(), 24), item.title());
        }
        println!();
    }

    print_recent(&RecentTracker::new(db).load_recent());
    Ok(())
}

fn run_browse(backend: &dyn CatalogBackend, config: &AppConfig, args: BrowseArgs) -> Result<()> {
    let kind = CatalogKind::from(args.kind);
    let mut view = load_view(backend, config, kind)?;
    view.filter.query = args.query;
    view.filter.category = args.category;
    view.filter.liked_only = args.liked;

    let rows = view.visible();
    if rows.is_empty() {
        if view.filter.has_query() {
            println!(
                "No {} match \"{}\". Run `omnia request \"{}\"` to ask for it.",
                kind.plural(),
                view.filter.query.trim(),
                view.filter.query.trim()
            );
        } else {
            println!("No {} to show.", kind.plural());
        }
        return Ok(());
    }

    println!("{:<3} {:<12} {:<40} {:<40}", "", "ID", "TITLE", "DETAILS");
    for item in rows {
        println!(
            "{:<3} {:<12} {:<40} {:<40}",
            liked_marker(item.liked()),
            truncate(&item.key().to_string(), 12),
            truncate(item.title(), 40),
            truncate(&summary_text(item), 40)
        );
    }
    Ok(())
}

fn run_categories(
    backend: &dyn CatalogBackend,
    config: &AppConfig,
    kind: CatalogKind,
) -> Result<()> {
    let view = load_view(backend, config, kind)?;
    let lines = category_group_lines(&view.category_groups());
    if lines.is_empty() {
        println!("No {} categories found.", kind.plural());
        return Ok(());
    }
    println!("{}s of {}:", kind.descriptor().category_label, kind.plural());
    for line in lines {
        println!("  {line}");
    }
    Ok(())
}

fn run_open(
    db: &Database,
    backend: &dyn CatalogBackend,
    config: &AppConfig,
    kind: CatalogKind,
    id: &str,
) -> Result<()> {
    let view = load_view(backend, config, kind)?;
    let item = find_item(&view, id)?;
    println!("{} {}", liked_marker(item.liked()), item.title());
    for (label, value) in detail_lines(item) {
        println!("  {label:<14} {value}");
    }
    RecentTracker::new(db).record_visit(item);
    Ok(())
}

fn run_like(
    backend: &dyn CatalogBackend,
    config: &AppConfig,
    kind: CatalogKind,
    id: &str,
) -> Result<()> {
    let mut view = load_view(backend, config, kind)?;
    let key = find_item(&view, id)?.key().clone();
    let liked = toggle(&mut view, backend, &key)?;
    let title = view.find(&key).map(CatalogItem::title).unwrap_or_default();
    if liked {
        println!("Liked: {title}");
    } else {
        println!("Unliked: {title}");
    }
    Ok(())
}

fn run_recent(db: &Database) {
    print_recent(&RecentTracker::new(db).load_recent());
}

fn run_request(
    backend: &dyn CatalogBackend,
    config: &AppConfig,
    text: &str,
    kind: Option<CatalogKind>,
) -> Result<()> {
    if text.trim().is_empty() {
        bail!("request text is empty");
    }
    if !submit_request(backend, &config.tables.requests, kind, text) {
        bail!("request could not be sent; see the log for details");
    }
    println!("Request sent for \"{}\".", text.trim());
    Ok(())
}

fn run_add(backend: &dyn CatalogBackend, config: &AppConfig, args: AddArgs) -> Result<()> {
    let kind = CatalogKind::from(args.kind);
    if args.title.trim().is_empty() {
        bail!("title must not be empty");
    }
    let key = args
        .id
        .as_deref()
        .map(|raw| parse_key(kind, raw))
        .transpose()?;
    let record = kind.descriptor().new_record(key.as_ref(), &args.title, &args.detail);

    let mut view = CatalogView::new(
        kind,
        config.tables.for_kind(kind),
        config.views.policy_for(kind),
    );
    let added = view
        .add_item(backend, record)
        .ok_or_else(|| anyhow!("failed to add {}; see the log for details", kind.label()))?;
    println!("Added {} {}: {}", kind.label(), added.key(), added.title());
    Ok(())
}

fn run_config(config: &AppConfig, config_path: &Path, write: bool) -> Result<()> {
    if write {
        config.save(config_path)?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }
    println!("# {}", config_path.display());
    print!(
        "{}",
        toml::to_string_pretty(config).context("failed to serialize config")?
    );
    Ok(())
}

fn print_recent(entries: &[RecentEntry]) {
    if entries.is_empty() {
        println!("Nothing viewed recently.");
        return;
    }
    println!("Recently viewed:");
    println!("  {:<12} {:<12} {:<40} {:<18}", "KIND", "ID", "TITLE", "SEEN");
    for entry in entries {
        println!(
            "  {:<12} {:<12} {:<40} {:<18}",
            entry.kind.label(),
            truncate(&entry.id, 12),
            truncate(&entry.title, 40),
            format_seen_at(&entry.timestamp)
        );
    }
}

/// Loads a fresh snapshot of `kind`, failing on any backend error.
pub(crate) fn load_view(
    backend: &dyn CatalogBackend,
    config: &AppConfig,
    kind: CatalogKind,
) -> Result<CatalogView> {
    let mut view = CatalogView::new(
        kind,
        config.tables.for_kind(kind),
        config.views.policy_for(kind),
    );
    if let LoadState::Failed(message) = view.load(backend) {
        bail!("{message}");
    }
    Ok(view)
}

pub(crate) fn parse_key(kind: CatalogKind, raw: &str) -> Result<ItemKey> {
    ItemKey::parse(kind, raw)
        .ok_or_else(|| anyhow!("\"{raw}\" is not a valid {} id", kind.label()))
}

pub(crate) fn find_item<'a>(view: &'a CatalogView, raw: &str) -> Result<&'a CatalogItem> {
    let kind = view.kind();
    let key = parse_key(kind, raw)?;
    view.find(&key).ok_or_else(|| anyhow!("no {} with id {key}", kind.label()))
}

pub(crate) fn toggle(
    view: &mut CatalogView,
    backend: &dyn CatalogBackend,
    key: &ItemKey,
) -> Result<bool> {
    view.toggle_like(backend, key)
        .ok_or_else(|| anyhow!("like update failed; see the log for details"))
}

fn connect(config: &AppConfig) -> Result<RestBackend> {
    RestBackend::new(
        &config.backend.url,
        &config.backend.api_key,
        config.backend.connect_timeout(),
        config.backend.read_timeout(),
    )
    .context("cannot reach the catalog backend")
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}
