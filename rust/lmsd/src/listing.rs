use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Question bank / catalog entry as the UI hands it over. Fields the filter
/// does not look at are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Searchable for BankItem {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        if let Some(d) = self.description.as_deref() {
            fields.push(d);
        }
        fields.extend(self.tags.iter().map(|t| t.as_str()));
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

pub fn filter_by_search<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| {
            item.search_fields()
                .iter()
                .any(|f| f.to_lowercase().contains(&needle))
        })
        .collect()
}

/// 1-based pages. Out-of-range pages clamp to the nearest valid one and an
/// empty list still reports a single (empty) page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    Page {
        items: items.get(start..end).map(|s| s.to_vec()).unwrap_or_default(),
        page,
        page_size,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, title: &str, tags: &[&str]) -> BankItem {
        BankItem {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            extra: Map::new(),
        }
    }

    fn bank() -> Vec<BankItem> {
        vec![
            item("q1", "Ownership and borrowing", &["rust", "memory"]),
            item("q2", "Binary search trees", &["algorithms"]),
            item("q3", "Lifetimes in practice", &["Rust"]),
            item("q4", "Graph traversal", &["algorithms", "graphs"]),
        ]
    }

    #[test]
    fn blank_query_keeps_everything_in_order() {
        let items = bank();
        let hits = filter_by_search(&items, "   ");
        let ids: Vec<&str> = hits.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_tags() {
        let items = bank();
        let ids: Vec<&str> = filter_by_search(&items, "RUST")
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["q1", "q3"]);

        let ids: Vec<&str> = filter_by_search(&items, "tree")
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["q2"]);
    }

    #[test]
    fn search_matches_description() {
        let mut items = bank();
        items[3].description = Some("BFS and DFS".to_string());
        let hits = filter_by_search(&items, "dfs");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "q4");
    }

    #[test]
    fn paginate_splits_and_clamps() {
        let items: Vec<u32> = (1..=7).collect();
        let p1 = paginate(&items, 1, 3);
        assert_eq!(p1.items, vec![1, 2, 3]);
        assert_eq!(p1.total_pages, 3);
        assert_eq!(p1.total_items, 7);

        let last = paginate(&items, 3, 3);
        assert_eq!(last.items, vec![7]);

        let past_end = paginate(&items, 9, 3);
        assert_eq!(past_end.page, 3);
        assert_eq!(past_end.items, vec![7]);

        let before_start = paginate(&items, 0, 3);
        assert_eq!(before_start.page, 1);
    }

    #[test]
    fn paginate_empty_and_zero_page_size() {
        let empty: Vec<u32> = Vec::new();
        let p = paginate(&empty, 4, 10);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 1);
        assert!(p.items.is_empty());

        let items = vec!["a", "b"];
        let p = paginate(&items, 2, 0);
        assert_eq!(p.page_size, 1);
        assert_eq!(p.items, vec!["b"]);
    }

    #[test]
    fn extra_fields_survive_round_trip() {
        let raw = serde_json::json!({
            "id": "q9",
            "title": "Closures",
            "difficulty": "hard",
            "points": 5
        });
        let parsed: BankItem = serde_json::from_value(raw.clone()).expect("parse");
        assert_eq!(parsed.extra.get("difficulty"), Some(&serde_json::json!("hard")));
        let back = serde_json::to_value(&parsed).expect("serialize");
        assert_eq!(back["difficulty"], "hard");
        assert_eq!(back["points"], 5);
        assert_eq!(back["tags"], serde_json::json!([]));
    }
}
