use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};

use crate::catalog::CatalogItem;

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_seen_at(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn liked_marker(liked: bool) -> &'static str {
    if liked { "♥" } else { "·" }
}

/// `Label: value` pairs for the kind's summary columns, skipping blanks.
pub(crate) fn summary_text(item: &CatalogItem) -> String {
    item.kind()
        .descriptor()
        .summary_fields
        .iter()
        .filter_map(|(label, field)| {
            let value = item.field_text(field)?;
            (!value.trim().is_empty()).then(|| format!("{label}: {value}"))
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub(crate) fn detail_lines(item: &CatalogItem) -> Vec<(&'static str, String)> {
    item.kind()
        .descriptor()
        .detail_fields
        .iter()
        .map(|(label, field)| (*label, item.field_text(field).unwrap_or_else(|| "-".to_string())))
        .collect()
}

/// One `X: a, b, c` line per initial.
pub(crate) fn category_group_lines(groups: &BTreeMap<char, Vec<String>>) -> Vec<String> {
    groups
        .iter()
        .map(|(initial, members)| format!("{initial}: {}", members.join(", ")))
        .collect()
}
