use crate::types::{Millis, TabId, TAB_ID_NONE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last-active instant per tab, keyed by tab id.
///
/// Serialized as a JSON object whose keys are the decimal tab ids
/// (`{"12": 1700000000000}`), the layout stored under `tabTimestamps`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TimestampLedger {
    entries: BTreeMap<TabId, Millis>,
}

impl TimestampLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `now` as the tab's last-active instant. Returns false (and does
    /// nothing) for the none/invalid tab id.
    pub fn touch(&mut self, tab_id: TabId, now: Millis) -> bool {
        if !is_valid_tab_id(tab_id) {
            return false;
        }
        self.entries.insert(tab_id, now);
        true
    }

    /// Drop the tab's entry. Returns true if one existed.
    pub fn forget(&mut self, tab_id: TabId) -> bool {
        self.entries.remove(&tab_id).is_some()
    }

    pub fn get(&self, tab_id: TabId) -> Option<Millis> {
        self.entries.get(&tab_id).copied()
    }

    /// Last-active instant, treating an unknown tab as active at `now`.
    pub fn last_active_or(&self, tab_id: TabId, now: Millis) -> Millis {
        self.get(tab_id).unwrap_or(now)
    }

    /// Keep only entries whose tab id satisfies `keep`. Returns how many were dropped.
    pub fn retain_tabs(&mut self, mut keep: impl FnMut(TabId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| keep(*id));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a stored `tabTimestamps` object one entry at a time. Entries with
    /// a non-numeric key or value are skipped, not the whole ledger.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let mut ledger = Self::new();
        let Some(obj) = value.as_object() else {
            if !value.is_null() {
                tracing::warn!(value = %value, "tab timestamps are not an object, starting empty");
            }
            return ledger;
        };
        for (key, ts) in obj {
            match (key.parse::<TabId>(), ts.as_i64()) {
                (Ok(id), Some(ts)) if is_valid_tab_id(id) => {
                    ledger.entries.insert(id, ts);
                }
                _ => tracing::warn!(key = %key, value = %ts, "skipping malformed tab timestamp"),
            }
        }
        ledger
    }
}

pub fn is_valid_tab_id(tab_id: TabId) -> bool {
    tab_id != TAB_ID_NONE && tab_id >= 0
}
