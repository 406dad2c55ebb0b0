use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ItemKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Movie,
    Show,
    Game,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Text,
    Integer,
}

/// Everything that differs between catalog kinds, expressed as data so the
/// views stay generic.
#[derive(Debug)]
pub struct KindDescriptor {
    pub key_field: &'static str,
    pub key_type: KeyType,
    pub title_field: &'static str,
    /// Comma-separated category tokens live here.
    pub category_field: &'static str,
    pub category_label: &'static str,
    /// Searched in addition to the title.
    pub search_fields: &'static [&'static str],
    /// Shown next to the title in lists.
    pub summary_fields: &'static [(&'static str, &'static str)],
    pub detail_fields: &'static [(&'static str, &'static str)],
    /// Second free-text field collected when adding an item.
    pub secondary_field: &'static str,
}

const VIDEO_DETAIL_FIELDS: &[(&str, &str)] = &[
    ("Type", "type"),
    ("Director", "director"),
    ("Cast", "cast"),
    ("Country", "country"),
    ("Date Added", "date_added"),
    ("Release Year", "release_year"),
    ("Rating", "rating"),
    ("Duration", "duration"),
    ("Genre", "listed_in"),
    ("Description", "description"),
];

static MOVIE: KindDescriptor = KindDescriptor {
    key_field: "show_id",
    key_type: KeyType::Text,
    title_field: "title",
    category_field: "listed_in",
    category_label: "Genre",
    search_fields: &["description"],
    summary_fields: &[("Release Year", "release_year"), ("Director", "director")],
    detail_fields: VIDEO_DETAIL_FIELDS,
    secondary_field: "description",
};

static SHOW: KindDescriptor = KindDescriptor {
    key_field: "show_id",
    key_type: KeyType::Text,
    title_field: "title",
    category_field: "listed_in",
    category_label: "Genre",
    search_fields: &["description"],
    summary_fields: &[("Release Year", "release_year"), ("Rating", "rating")],
    detail_fields: VIDEO_DETAIL_FIELDS,
    secondary_field: "description",
};

static GAME: KindDescriptor = KindDescriptor {
    key_field: "ID",
    key_type: KeyType::Integer,
    title_field: "GameName",
    category_field: "Console",
    category_label: "Console",
    search_fields: &["Console", "Review"],
    summary_fields: &[("Console", "Console"), ("Score", "Score")],
    detail_fields: &[("Console", "Console"), ("Score", "Score"), ("Review", "Review")],
    secondary_field: "Console",
};

impl CatalogKind {
    pub const ALL: [CatalogKind; 3] = [Self::Movie, Self::Show, Self::Game];

    pub fn descriptor(self) -> &'static KindDescriptor {
        match self {
            Self::Movie => &MOVIE,
            Self::Show => &SHOW,
            Self::Game => &GAME,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
            Self::Game => "game",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Show => "TV Show",
            Self::Game => "Video Game",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Self::Movie => "movies",
            Self::Show => "TV shows",
            Self::Game => "video games",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Movie => Self::Show,
            Self::Show => Self::Game,
            Self::Game => Self::Movie,
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl KindDescriptor {
    /// Record for a brand new, not yet liked item.
    pub fn new_record(&self, key: Option<&ItemKey>, title: &str, secondary: &str) -> Value {
        let mut record = Map::new();
        if let Some(key) = key {
            record.insert(self.key_field.to_string(), key.to_value());
        }
        record.insert(self.title_field.to_string(), Value::String(title.trim().to_string()));
        if !secondary.trim().is_empty() {
            record.insert(
                self.secondary_field.to_string(),
                Value::String(secondary.trim().to_string()),
            );
        }
        record.insert("liked".to_string(), Value::Bool(false));
        Value::Object(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&CatalogKind::Show).expect("ser"), "\"show\"");
        let kind: CatalogKind = serde_json::from_str("\"game\"").expect("de");
        assert_eq!(kind, CatalogKind::Game);
    }

    #[test]
    fn next_cycles_through_every_kind() {
        let mut kind = CatalogKind::Movie;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(kind);
            kind = kind.next();
        }
        assert_eq!(seen, CatalogKind::ALL);
        assert_eq!(kind, CatalogKind::Movie);
    }

    #[test]
    fn new_game_record_uses_game_columns() {
        let record = CatalogKind::Game.descriptor().new_record(
            Some(&ItemKey::Int(12)),
            " Hades ",
            "Switch",
        );
        assert_eq!(
            record,
            json!({"ID": 12, "GameName": "Hades", "Console": "Switch", "liked": false})
        );
    }

    #[test]
    fn new_movie_record_skips_blank_description() {
        let record = CatalogKind::Movie
            .descriptor()
            .new_record(None, "Heat", "   ");
        assert_eq!(record, json!({"title": "Heat", "liked": false}));
    }
}
