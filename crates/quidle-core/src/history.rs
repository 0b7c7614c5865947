//! Bounded, newest-first log of tabs the sweeper handled.

use crate::settings::ActionMode;
use crate::types::{Millis, TabId, TabSnapshot};
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept.
pub const HISTORY_CAP: usize = 10;

/// A new entry with the same URL as the newest one is dropped if it arrives
/// within this many milliseconds.
pub const DEDUP_WINDOW_MS: Millis = 5_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub fav_icon_url: String,
    #[serde(default)]
    pub closed_at: Millis,
    /// Original tab id; only present for suspended tabs, which stay open.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
}

impl HistoryEntry {
    /// Build the entry recorded after `mode` was applied to `tab`.
    pub fn for_action(tab: &TabSnapshot, mode: ActionMode, now: Millis) -> Self {
        Self {
            url: tab
                .url
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "about:blank".to_string()),
            title: tab
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            fav_icon_url: tab.fav_icon_url.clone().unwrap_or_default(),
            closed_at: now,
            tab_id: match mode {
                ActionMode::Suspend => Some(tab.id),
                ActionMode::Close => None,
            },
        }
    }

    /// Whether `self` (the newer entry) repeats `previous`.
    pub fn duplicates(&self, previous: &HistoryEntry) -> bool {
        if let (Some(a), Some(b)) = (self.tab_id, previous.tab_id) {
            if a == b {
                return true;
            }
        }
        self.url == previous.url
            && self.closed_at.saturating_sub(previous.closed_at) < DEDUP_WINDOW_MS
    }

    /// Title for display: title, else url, else a placeholder.
    pub fn display_title(&self) -> &str {
        if !self.title.is_empty() {
            &self.title
        } else if !self.url.is_empty() {
            &self.url
        } else {
            "Untitled Tab"
        }
    }

    pub fn display_url(&self) -> &str {
        if self.url.is_empty() {
            "about:blank"
        } else {
            &self.url
        }
    }

    /// Lenient parse of one stored entry. Returns `None` for non-objects and
    /// for objects carrying neither a title nor a url.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let url = text("url");
        let title = text("title");
        if url.is_empty() && title.is_empty() {
            return None;
        }
        Some(Self {
            url,
            title,
            fav_icon_url: text("favIconUrl"),
            closed_at: obj.get("closedAt").and_then(|v| v.as_i64()).unwrap_or(0),
            tab_id: obj.get("id").and_then(|v| v.as_i64()),
        })
    }
}

/// Newest-first history, never longer than [`HISTORY_CAP`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(HISTORY_CAP);
        Self { entries }
    }

    /// Parse stored history, skipping malformed entries.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let entries = match value.as_array() {
            Some(items) => items
                .iter()
                .filter_map(|item| {
                    let parsed = HistoryEntry::from_value(item);
                    if parsed.is_none() {
                        tracing::warn!(entry = %item, "skipping malformed history entry");
                    }
                    parsed
                })
                .collect(),
            None => Vec::new(),
        };
        Self::from_entries(entries)
    }

    /// Prepend `entry` unless it duplicates the newest entry. Returns whether
    /// it was inserted.
    pub fn record(&mut self, entry: HistoryEntry) -> bool {
        if let Some(newest) = self.entries.first() {
            if entry.duplicates(newest) {
                return false;
            }
        }
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
        true
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(url: &str, at: Millis, tab_id: Option<TabId>) -> HistoryEntry {
        HistoryEntry {
            url: url.into(),
            title: url.into(),
            fav_icon_url: String::new(),
            closed_at: at,
            tab_id,
        }
    }

    #[test]
    fn record_prepends_and_caps() {
        let mut history = History::new();
        for i in 0..25 {
            assert!(history.record(entry(&format!("https://{i}.test/"), i * 10_000, None)));
            assert!(history.len() <= HISTORY_CAP);
        }
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history.get(0).unwrap().url, "https://24.test/");
        assert_eq!(history.get(9).unwrap().url, "https://15.test/");
    }

    #[test]
    fn same_url_within_window_is_skipped() {
        let mut history = History::new();
        assert!(history.record(entry("https://a.test/", 1_000, None)));
        assert!(!history.record(entry("https://a.test/", 5_999, None)));
        assert!(history.record(entry("https://a.test/", 6_000, None)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn same_tab_id_is_skipped_regardless_of_time() {
        let mut history = History::new();
        assert!(history.record(entry("https://a.test/", 0, Some(4))));
        assert!(!history.record(entry("https://b.test/", 600_000, Some(4))));
        assert!(history.record(entry("https://b.test/", 600_000, Some(5))));
    }

    #[test]
    fn only_newest_entry_is_checked() {
        let mut history = History::new();
        history.record(entry("https://a.test/", 0, None));
        history.record(entry("https://b.test/", 100, None));
        assert!(history.record(entry("https://a.test/", 200, None)));
    }

    #[test]
    fn for_action_fills_fallbacks() {
        let tab = TabSnapshot {
            id: 3,
            ..TabSnapshot::default()
        };
        let suspended = HistoryEntry::for_action(&tab, ActionMode::Suspend, 42);
        assert_eq!(suspended.url, "about:blank");
        assert_eq!(suspended.title, "Untitled");
        assert_eq!(suspended.tab_id, Some(3));
        assert_eq!(suspended.closed_at, 42);

        let closed = HistoryEntry::for_action(&tab, ActionMode::Close, 42);
        assert_eq!(closed.tab_id, None);
    }

    #[test]
    fn stored_layout_uses_camel_case_keys() {
        let e = entry("https://a.test/", 7, Some(9));
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["closedAt"], 7);
        assert_eq!(v["id"], 9);
        assert_eq!(v["favIconUrl"], "");
        let closed = serde_json::to_value(entry("https://a.test/", 7, None)).unwrap();
        assert!(closed.get("id").is_none());
    }

    #[test]
    fn malformed_entries_skipped() {
        let raw = json!([
            "junk",
            null,
            {"favIconUrl": "x"},
            {"title": "Only title"},
            {"url": "https://u.test/", "closedAt": 5, "id": 2},
        ]);
        let history = History::from_value(&raw);
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0).unwrap().display_title(), "Only title");
        assert_eq!(history.get(0).unwrap().display_url(), "about:blank");
        assert_eq!(history.get(1).unwrap().display_title(), "https://u.test/");
        assert_eq!(history.get(1).unwrap().tab_id, Some(2));
    }

    #[test]
    fn non_array_reads_as_empty() {
        assert!(History::from_value(&json!({"a": 1})).is_empty());
    }
}
