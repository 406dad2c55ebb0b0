use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::CatalogItem;

/// What a view shows while the search box is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyQueryPolicy {
    /// Browsable list: the liked/category filters still apply.
    #[default]
    ShowAll,
    /// Nothing is listed until the user types.
    ShowNone,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub query: String,
    pub category: Option<String>,
    pub liked_only: bool,
}

impl Filter {
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// A selected category must equal one of the item's category tokens;
    /// a substring of a token does not match.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if self.liked_only && !item.liked() {
            return false;
        }
        if let Some(category) = self.category.as_deref()
            && !item.category_tokens().any(|token| token == category)
        {
            return false;
        }
        let needle = self.query.trim().to_lowercase();
        needle.is_empty() || item.matches_text(&needle)
    }
}

/// Items passing `filter`, in snapshot order.
pub fn filter_items<'a>(
    items: &'a [CatalogItem],
    filter: &Filter,
    policy: EmptyQueryPolicy,
) -> Vec<&'a CatalogItem> {
    if policy == EmptyQueryPolicy::ShowNone && !filter.has_query() {
        return Vec::new();
    }
    items.iter().filter(|item| filter.matches(item)).collect()
}

pub fn extract_categories(items: &[CatalogItem]) -> BTreeSet<String> {
    items
        .iter()
        .flat_map(CatalogItem::category_tokens)
        .map(str::to_string)
        .collect()
}

/// Groups categories under the uppercase form of their first character.
pub fn group_by_initial<'a, I>(categories: I) -> BTreeMap<char, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: BTreeMap<char, Vec<String>> = BTreeMap::new();
    for category in categories {
        let category = category.trim();
        let Some(first) = category.chars().next() else {
            continue;
        };
        let initial = first.to_uppercase().next().unwrap_or(first);
        groups.entry(initial).or_default().push(category.to_string());
    }
    for members in groups.values_mut() {
        members.sort();
        members.dedup();
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogKind;
    use serde_json::json;

    fn movie(id: &str, title: &str, genres: &str, liked: bool) -> CatalogItem {
        CatalogItem::from_row(
            CatalogKind::Movie,
            json!({
                "show_id": id,
                "title": title,
                "listed_in": genres,
                "description": format!("about {title}"),
                "liked": liked
            }),
        )
        .expect("movie row")
    }

    fn sample() -> Vec<CatalogItem> {
        vec![
            movie("s1", "The Matrix", "Action, Sci-Fi", true),
            movie("s2", "Amelie", "Comedy, Romance", false),
            movie("s3", "Matrix Reloaded", "Action", false),
            movie("s4", "Paddington", "Comedy, Family", true),
        ]
    }

    fn ids(items: &[&CatalogItem]) -> Vec<String> {
        items.iter().map(|item| item.key().to_string()).collect()
    }

    #[test]
    fn query_matches_title_case_insensitively() {
        let items = sample();
        let filter = Filter {
            query: "MATRIX".to_string(),
            ..Filter::default()
        };
        let visible = filter_items(&items, &filter, EmptyQueryPolicy::ShowAll);
        assert_eq!(ids(&visible), vec!["s1", "s3"]);
    }

    #[test]
    fn empty_query_with_show_none_lists_nothing() {
        let items = sample();
        let filter = Filter {
            query: "   ".to_string(),
            liked_only: true,
            ..Filter::default()
        };
        assert!(filter_items(&items, &filter, EmptyQueryPolicy::ShowNone).is_empty());
    }

    #[test]
    fn empty_query_with_show_all_applies_remaining_filters() {
        let items = sample();
        let filter = Filter {
            liked_only: true,
            ..Filter::default()
        };
        let visible = filter_items(&items, &filter, EmptyQueryPolicy::ShowAll);
        assert_eq!(ids(&visible), vec!["s1", "s4"]);

        let everything = filter_items(&items, &Filter::default(), EmptyQueryPolicy::ShowAll);
        assert_eq!(everything.len(), items.len());
    }

    #[test]
    fn all_three_filters_are_conjunctive() {
        let items = sample();
        let filter = Filter {
            query: "a".to_string(),
            category: Some("Comedy".to_string()),
            liked_only: true,
        };
        let visible = filter_items(&items, &filter, EmptyQueryPolicy::ShowNone);
        assert_eq!(ids(&visible), vec!["s4"]);
    }

    #[test]
    fn category_matches_whole_tokens() {
        let items = vec![movie("s1", "One", "Dramas", false), movie("s2", "Two", "Drama", false)];
        let filter = Filter {
            category: Some("Drama".to_string()),
            ..Filter::default()
        };
        let visible = filter_items(&items, &filter, EmptyQueryPolicy::ShowAll);
        assert_eq!(ids(&visible), vec!["s2"]);
    }

    #[test]
    fn categories_are_distinct_trimmed_tokens() {
        let items = vec![
            movie("s1", "One", " Drama ,Comedy", false),
            movie("s2", "Two", "Comedy,, Thriller", false),
        ];
        let categories: Vec<String> = extract_categories(&items).into_iter().collect();
        assert_eq!(categories, vec!["Comedy", "Drama", "Thriller"]);
    }

    #[test]
    fn grouping_keys_by_uppercase_initial() {
        let groups = group_by_initial(["Drama", "action", "Comedy"]);
        let expected: BTreeMap<char, Vec<String>> = [
            ('A', vec!["action".to_string()]),
            ('C', vec!["Comedy".to_string()]),
            ('D', vec!["Drama".to_string()]),
        ]
        .into_iter()
        .collect();
        assert_eq!(groups, expected);
    }

    #[test]
    fn grouping_sorts_members_within_a_group() {
        let groups = group_by_initial(["Documentaries", "Drama", "Dance", "Drama", ""]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&'D'], vec!["Dance", "Documentaries", "Drama"]);
    }
}
