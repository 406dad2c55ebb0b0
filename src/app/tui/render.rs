use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Padding, Paragraph, Row, Table, Wrap,
};

use crate::catalog::{CatalogItem, EmptyQueryPolicy, LoadState};
use crate::recent::RecentEntry;

use super::super::format::{
    category_group_lines, detail_lines, format_seen_at, liked_marker, summary_text, truncate,
};
use super::{HomeState, InputMode, Screen, TuiApp};

const ACCENT: Color = Color::Rgb(110, 170, 255);
const MUTED: Color = Color::Rgb(185, 195, 210);
const TEXT: Color = Color::Rgb(230, 230, 230);
const HEART: Color = Color::Rgb(255, 110, 130);

pub(super) fn draw_tui(frame: &mut Frame, app: &mut TuiApp) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(header(app), chunks[0]);
    frame.render_widget(filter_bar(app), chunks[1]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
        .split(chunks[2]);
    draw_listing(frame, app, body_chunks[0]);
    draw_side_panels(frame, app, body_chunks[1]);

    let controls = Paragraph::new(controls_line(app))
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[3]);

    let status_widget = Paragraph::new(app.status.clone())
        .style(status_style(&app.status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[4]);

    if let Some(item) = app.detail.as_ref() {
        let text = detail_popup_text(item);
        let popup_area = popup_rect_for_text(frame.area(), &text);
        render_popup_shadow(frame, popup_area);
        frame.render_widget(Clear, popup_area);
        let popup = Paragraph::new(text)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true })
            .block(modal_block(item.kind().label()));
        frame.render_widget(popup, popup_area);
    } else if let Some(notice) = app.notice.as_ref() {
        let popup_area = popup_rect_for_text(frame.area(), &notice.message);
        render_popup_shadow(frame, popup_area);
        frame.render_widget(Clear, popup_area);
        let popup = Paragraph::new(notice.message.clone())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(modal_block(notice.title));
        frame.render_widget(popup, popup_area);
    }
}

fn header(app: &TuiApp) -> Paragraph<'static> {
    let mut spans = vec![
        Span::styled(
            "OMNIA",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
    ];
    for screen in Screen::ALL {
        spans.push(Span::styled(
            format!(" {} ", screen.label()),
            if screen == app.screen {
                pill_active()
            } else {
                pill_inactive()
            },
        ));
        spans.push(Span::styled(" ", Style::default()));
    }
    spans.push(Span::styled(
        format!("  {} shown", app.rows().len()),
        Style::default().fg(MUTED),
    ));
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(panel_block("Catalog"))
}

fn filter_bar(app: &TuiApp) -> Paragraph<'static> {
    let Screen::Catalog(kind) = app.screen else {
        return Paragraph::new("Liked movies, TV shows and video games")
            .style(Style::default().fg(MUTED))
            .block(panel_block("Home"));
    };
    let view = &app.catalog(kind).view;
    let searching = app.input == InputMode::Search;
    let query_text = if searching {
        format!("{}▏", view.filter.query)
    } else if view.filter.query.is_empty() {
        "-".to_string()
    } else {
        view.filter.query.clone()
    };
    let label = kind.descriptor().category_label;
    let line = Line::from(vec![
        Span::styled("Search ", Style::default().fg(MUTED)),
        Span::styled(
            truncate(&query_text, 32),
            if searching {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(TEXT)
            },
        ),
        Span::styled(format!("   {label} "), Style::default().fg(MUTED)),
        Span::styled(
            view.filter.category.clone().unwrap_or_else(|| "all".to_string()),
            Style::default().fg(TEXT),
        ),
        Span::styled("   Liked only ", Style::default().fg(MUTED)),
        Span::styled(
            if view.filter.liked_only { "on" } else { "off" },
            Style::default().fg(if view.filter.liked_only { HEART } else { TEXT }),
        ),
    ]);
    Paragraph::new(line).block(panel_block("Filter"))
}

fn draw_listing(frame: &mut Frame, app: &mut TuiApp, area: Rect) {
    if let Some(message) = blocking_message(app) {
        let widget = Paragraph::new(message)
            .style(Style::default().fg(TEXT))
            .wrap(Wrap { trim: true })
            .block(panel_block("Library"));
        frame.render_widget(widget, area);
        return;
    }

    let home = app.screen == Screen::Home;
    let rows: Vec<Row> = app
        .rows()
        .into_iter()
        .map(|item| {
            let heart = Cell::from(liked_marker(item.liked()))
                .style(Style::default().fg(if item.liked() { HEART } else { MUTED }));
            let mut cells = Vec::with_capacity(4);
            if home {
                cells.push(Cell::from(item.kind().label()));
            }
            cells.push(heart);
            cells.push(Cell::from(item.title().to_string()));
            cells.push(Cell::from(summary_text(item)));
            Row::new(cells)
        })
        .collect();

    let (widths, titles): (Vec<Constraint>, Vec<&str>) = if home {
        (
            vec![
                Constraint::Length(11),
                Constraint::Length(2),
                Constraint::Percentage(45),
                Constraint::Percentage(45),
            ],
            vec!["Kind", "", "Title", "Details"],
        )
    } else {
        (
            vec![
                Constraint::Length(2),
                Constraint::Percentage(50),
                Constraint::Percentage(48),
            ],
            vec!["", "Title", "Details"],
        )
    };

    let table = Table::new(rows, widths)
        .header(Row::new(titles).style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)))
        .block(panel_block("Library"))
        .row_highlight_style(
            Style::default()
                .bg(ACCENT)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, area, &mut app.table_state);
}

/// Text replacing the table while a screen cannot list anything.
fn blocking_message(app: &TuiApp) -> Option<String> {
    match app.screen {
        Screen::Home => match &app.home {
            HomeState::Loading => Some("Loading...".to_string()),
            HomeState::Failed(message) => Some(format!("Error: {message}\n\nPress R to retry.")),
            HomeState::Ready(dashboard) if dashboard.is_empty() => {
                Some("You haven't liked any items yet.".to_string())
            }
            HomeState::Ready(_) => None,
        },
        Screen::Catalog(kind) => {
            let view = &app.catalog(kind).view;
            match view.state() {
                LoadState::Loading => Some("Loading...".to_string()),
                LoadState::Failed(message) => {
                    Some(format!("Error: {message}\n\nPress R to retry."))
                }
                LoadState::Ready if !view.visible().is_empty() => None,
                LoadState::Ready => {
                    if view.filter.has_query() {
                        Some(format!(
                            "No {} match \"{}\".\n\nPress r to request it.",
                            kind.plural(),
                            truncate(view.filter.query.trim(), 40)
                        ))
                    } else if view.policy() == EmptyQueryPolicy::ShowNone {
                        Some(format!("Press / and type to search {}.", kind.plural()))
                    } else {
                        Some(format!("No {} to show.", kind.plural()))
                    }
                }
            }
        }
    }
}

fn draw_side_panels(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let catalog = matches!(app.screen, Screen::Catalog(_));
    let constraints = if catalog {
        vec![
            Constraint::Min(6),
            Constraint::Length(8),
            Constraint::Length(9),
        ]
    } else {
        vec![Constraint::Min(6), Constraint::Length(9)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let selection_text = match app.selected_item() {
        Some(item) => {
            let mut text = format!("{}\n\n", truncate(item.title(), 40));
            for (label, field) in item.kind().descriptor().summary_fields {
                let value = item.field_text(field).unwrap_or_else(|| "-".to_string());
                text.push_str(&format!("{label}\n{}\n\n", truncate(&value, 40)));
            }
            text.push_str(if item.liked() { "♥ Liked" } else { "Not liked" });
            text
        }
        None => "Nothing selected.".to_string(),
    };
    let selection = Paragraph::new(selection_text)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: true })
        .block(panel_block("Selected"));
    frame.render_widget(selection, chunks[0]);

    let recent_area = if let Screen::Catalog(kind) = app.screen {
        let view = &app.catalog(kind).view;
        let lines = category_group_lines(&view.category_groups());
        let text = if lines.is_empty() {
            "-".to_string()
        } else {
            lines.join("\n")
        };
        let categories = Paragraph::new(text)
            .style(Style::default().fg(MUTED))
            .wrap(Wrap { trim: true })
            .block(panel_block("Categories"));
        frame.render_widget(categories, chunks[1]);
        chunks[2]
    } else {
        chunks[1]
    };

    let recent = Paragraph::new(recent_text(app.recent_entries()))
        .style(Style::default().fg(TEXT))
        .block(panel_block("Recently Viewed"));
    frame.render_widget(recent, recent_area);
}

fn recent_text(entries: &[RecentEntry]) -> String {
    if entries.is_empty() {
        return "Nothing opened yet.".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "{:<6} {}  {}",
                entry.kind.as_str(),
                truncate(&entry.title, 24),
                format_seen_at(&entry.timestamp)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn detail_popup_text(item: &CatalogItem) -> String {
    let mut text = format!("{}\n\n", item.title());
    for (label, value) in detail_lines(item) {
        text.push_str(&format!("{label}: {value}\n"));
    }
    text.push_str(&format!(
        "\n{}   [l] like/unlike   [Esc] close",
        if item.liked() { "♥ Liked" } else { "Not liked" }
    ));
    text
}

fn controls_line(app: &TuiApp) -> Line<'static> {
    let keys = match (app.screen, app.input) {
        (_, InputMode::Search) => "type to filter  Backspace delete  Ctrl-U clear  Enter/Esc done",
        (Screen::Home, _) => "Tab/←/→ screen  ↑/↓ move  Enter open  l like  R reload  q quit",
        (Screen::Catalog(_), _) => {
            "Tab screen  ↑/↓ move  Enter open  l like  / search  f liked  c category  x clear  r request  R reload  q quit"
        }
    };
    Line::from(Span::styled(keys, Style::default().fg(MUTED)))
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn modal_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(160, 190, 235))
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

fn pill_active() -> Style {
    Style::default()
        .bg(ACCENT)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn pill_inactive() -> Style {
    Style::default()
        .bg(Color::Rgb(72, 82, 96))
        .fg(Color::Rgb(230, 235, 242))
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}

fn centered_fixed_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width.max(1));
    let clamped_height = height.min(area.height.max(1));
    let x = area.x + area.width.saturating_sub(clamped_width) / 2;
    let y = area.y + area.height.saturating_sub(clamped_height) / 2;
    Rect::new(x, y, clamped_width, clamped_height)
}

fn render_popup_shadow(frame: &mut Frame, popup_area: Rect) {
    let area = frame.area();
    let shadow = Rect::new(
        (popup_area.x + 1).min(area.x + area.width.saturating_sub(1)),
        (popup_area.y + 1).min(area.y + area.height.saturating_sub(1)),
        popup_area.width.saturating_sub(1),
        popup_area.height.saturating_sub(1),
    );
    if shadow.width == 0 || shadow.height == 0 {
        return;
    }
    let shadow_block = Block::default().style(Style::default().bg(Color::Rgb(14, 16, 24)));
    frame.render_widget(shadow_block, shadow);
}

fn popup_rect_for_text(area: Rect, text: &str) -> Rect {
    let max_line_width = text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let line_count = text.lines().count() as u16;

    let available_width = area.width.saturating_sub(2).max(1);
    let min_width = 48.min(available_width);
    let max_width = 80.min(available_width);
    let desired_width = max_line_width.saturating_add(12);
    let width = desired_width.clamp(min_width, max_width);

    let available_height = area.height.saturating_sub(2).max(1);
    let min_height = 10.min(available_height);
    let max_height = 24.min(available_height);
    let desired_height = line_count.saturating_add(6);
    let height = desired_height.clamp(min_height, max_height);

    centered_fixed_rect(width, height, area)
}
