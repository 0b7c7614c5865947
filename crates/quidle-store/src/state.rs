//! Typed access to the flat storage keys shared by the sweeper and the viewer.

use crate::kv::{KvMap, KvStore, StoreError};
use quidle_core::{
    ActionMode, AlarmSpec, Counters, History, HistoryEntry, Settings, TimestampLedger,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Stored form of an alarm schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct StoredAlarm {
    delay_secs: u64,
    period_secs: u64,
}

/// Storage key names. These are the on-disk layout; do not rename.
pub mod keys {
    pub const TAB_LIMIT: &str = "tabLimit";
    pub const INACTIVITY_TIMER: &str = "inactivityTimer";
    pub const WHITELIST: &str = "whitelist";
    pub const EXTENSION_ENABLED: &str = "extensionEnabled";
    pub const ACTION_TYPE: &str = "actionType";
    pub const TOTAL_DISCARDED: &str = "totalDiscardedCount";
    pub const TOTAL_CLOSED: &str = "totalClosedCount";
    pub const TAB_TIMESTAMPS: &str = "tabTimestamps";
    pub const CLOSED_TABS_HISTORY: &str = "closedTabsHistory";
    pub const ALARMS: &str = "alarms";

    pub const SETTINGS: [&str; 5] = [
        TAB_LIMIT,
        INACTIVITY_TIMER,
        WHITELIST,
        EXTENSION_ENABLED,
        ACTION_TYPE,
    ];
}

/// Typed facade over a [`KvStore`]. Cheap to clone.
#[derive(Clone)]
pub struct StateStore {
    kv: Arc<dyn KvStore>,
}

impl StateStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    // ── Settings ──

    /// Current settings; absent or malformed keys fall back to defaults.
    pub fn settings(&self) -> Result<Settings, StoreError> {
        let map = self.kv.get(&keys::SETTINGS)?;
        Ok(settings_from_map(&map))
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.kv.set(settings_to_map(settings))
    }

    /// Write defaults for every absent settings and counter key, leaving
    /// existing values alone. Returns the keys that were filled in.
    pub fn apply_defaults(&self) -> Result<Vec<String>, StoreError> {
        let mut defaults = settings_to_map(&Settings::default());
        defaults.insert(keys::TOTAL_DISCARDED.into(), json!(0));
        defaults.insert(keys::TOTAL_CLOSED.into(), json!(0));

        let mut written = Vec::new();
        self.kv.update(&mut |map| {
            written.clear();
            for (key, value) in &defaults {
                if !map.contains_key(key) {
                    map.insert(key.clone(), value.clone());
                    written.push(key.clone());
                }
            }
            Ok(!written.is_empty())
        })?;
        Ok(written)
    }

    // ── Ledger ──

    pub fn ledger(&self) -> Result<TimestampLedger, StoreError> {
        let map = self.kv.get(&[keys::TAB_TIMESTAMPS])?;
        Ok(read_ledger(&map))
    }

    /// Apply `f` to the stored ledger under the store lock. `f` returns
    /// whether it changed anything; only then is the ledger written back.
    pub fn update_ledger<F>(&self, f: F) -> Result<TimestampLedger, StoreError>
    where
        F: FnOnce(&mut TimestampLedger) -> bool,
    {
        let mut f = Some(f);
        let mut result = TimestampLedger::default();
        self.kv.update(&mut |map| {
            let mut ledger = read_ledger(map);
            let changed = f.take().is_some_and(|f| f(&mut ledger));
            if changed {
                map.insert(keys::TAB_TIMESTAMPS.into(), encode(keys::TAB_TIMESTAMPS, &ledger)?);
            }
            result = ledger;
            Ok(changed)
        })?;
        Ok(result)
    }

    // ── Alarms ──

    /// Create or replace a named periodic alarm.
    pub fn save_alarm(&self, name: &str, spec: AlarmSpec) -> Result<(), StoreError> {
        let stored = StoredAlarm {
            delay_secs: spec.delay.as_secs(),
            period_secs: spec.period.as_secs(),
        };
        self.kv.update(&mut |map| {
            let mut alarms: BTreeMap<String, StoredAlarm> = read_or_default(map, keys::ALARMS);
            alarms.insert(name.to_string(), stored);
            map.insert(keys::ALARMS.into(), encode(keys::ALARMS, &alarms)?);
            Ok(true)
        })
    }

    pub fn alarm(&self, name: &str) -> Result<Option<AlarmSpec>, StoreError> {
        let map = self.kv.get(&[keys::ALARMS])?;
        let alarms: BTreeMap<String, StoredAlarm> = read_or_default(&map, keys::ALARMS);
        Ok(alarms.get(name).map(|a| AlarmSpec {
            delay: Duration::from_secs(a.delay_secs),
            period: Duration::from_secs(a.period_secs),
        }))
    }

    // ── History ──

    pub fn history(&self) -> Result<History, StoreError> {
        let map = self.kv.get(&[keys::CLOSED_TABS_HISTORY])?;
        Ok(map
            .get(keys::CLOSED_TABS_HISTORY)
            .map(History::from_value)
            .unwrap_or_default())
    }

    /// Prepend `entry` subject to the duplicate check. Returns whether it was stored.
    pub fn record_history(&self, entry: HistoryEntry) -> Result<bool, StoreError> {
        let mut entry = Some(entry);
        let mut inserted = false;
        self.kv.update(&mut |map| {
            let mut history = map
                .get(keys::CLOSED_TABS_HISTORY)
                .map(History::from_value)
                .unwrap_or_default();
            inserted = entry.take().is_some_and(|e| history.record(e));
            if inserted {
                map.insert(
                    keys::CLOSED_TABS_HISTORY.into(),
                    encode(keys::CLOSED_TABS_HISTORY, &history)?,
                );
            }
            Ok(inserted)
        })?;
        Ok(inserted)
    }

    pub fn clear_history(&self) -> Result<(), StoreError> {
        let mut items = KvMap::new();
        items.insert(keys::CLOSED_TABS_HISTORY.into(), json!([]));
        self.kv.set(items)
    }

    // ── Counters ──

    pub fn counters(&self) -> Result<Counters, StoreError> {
        let map = self.kv.get(&[keys::TOTAL_DISCARDED, keys::TOTAL_CLOSED])?;
        Ok(Counters {
            total_discarded: read_or_default(&map, keys::TOTAL_DISCARDED),
            total_closed: read_or_default(&map, keys::TOTAL_CLOSED),
        })
    }

    /// Add one to the counter matching `mode` and return the new totals.
    pub fn bump_counter(&self, mode: ActionMode) -> Result<Counters, StoreError> {
        let key = match mode {
            ActionMode::Suspend => keys::TOTAL_DISCARDED,
            ActionMode::Close => keys::TOTAL_CLOSED,
        };
        let mut counters = Counters::default();
        self.kv.update(&mut |map| {
            let current: u64 = read_or_default(map, key);
            map.insert(key.into(), json!(current.saturating_add(1)));
            counters = Counters {
                total_discarded: read_or_default(map, keys::TOTAL_DISCARDED),
                total_closed: read_or_default(map, keys::TOTAL_CLOSED),
            };
            Ok(true)
        })?;
        Ok(counters)
    }

    pub fn clear_counters(&self) -> Result<(), StoreError> {
        let mut items = KvMap::new();
        items.insert(keys::TOTAL_DISCARDED.into(), json!(0));
        items.insert(keys::TOTAL_CLOSED.into(), json!(0));
        self.kv.set(items)
    }
}

fn settings_from_map(map: &KvMap) -> Settings {
    let defaults = Settings::default();
    let action = match map.get(keys::ACTION_TYPE).and_then(Value::as_str) {
        Some("close") => ActionMode::Close,
        Some(_) => ActionMode::Suspend,
        None => defaults.action,
    };
    Settings {
        tab_limit: read_or(map, keys::TAB_LIMIT, defaults.tab_limit),
        inactivity_minutes: read_or(map, keys::INACTIVITY_TIMER, defaults.inactivity_minutes),
        whitelist: read_or(map, keys::WHITELIST, defaults.whitelist),
        enabled: read_or(map, keys::EXTENSION_ENABLED, defaults.enabled),
        action,
    }
}

fn settings_to_map(settings: &Settings) -> KvMap {
    let mut map = KvMap::new();
    map.insert(keys::TAB_LIMIT.into(), json!(settings.tab_limit));
    map.insert(keys::INACTIVITY_TIMER.into(), json!(settings.inactivity_minutes));
    map.insert(keys::WHITELIST.into(), json!(settings.whitelist));
    map.insert(keys::EXTENSION_ENABLED.into(), json!(settings.enabled));
    map.insert(keys::ACTION_TYPE.into(), json!(settings.action.as_str()));
    map
}

fn read_or<T: DeserializeOwned>(map: &KvMap, key: &str, default: T) -> T {
    match map.get(key) {
        None | Some(Value::Null) => default,
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value has unexpected shape, using default");
                default
            }
        },
    }
}

fn read_ledger(map: &KvMap) -> TimestampLedger {
    map.get(keys::TAB_TIMESTAMPS)
        .map(TimestampLedger::from_value)
        .unwrap_or_default()
}

fn read_or_default<T: DeserializeOwned + Default>(map: &KvMap, key: &str) -> T {
    read_or(map, key, T::default())
}

fn encode<T: serde::Serialize>(key: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}
