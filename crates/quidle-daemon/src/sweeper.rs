//! One sweep: if too many tabs are open, suspend or close the oldest idle one.

use anyhow::{Context, Result};
use quidle_core::{
    eligible_tabs, now_ms, select_oldest, ActionMode, Counters, HistoryEntry, Millis, TabId,
};
use quidle_host::TabHost;
use quidle_store::StateStore;
use std::fmt;
use std::sync::Arc;

/// What a completed sweep did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Disabled,
    WithinLimit {
        open: usize,
        limit: u32,
    },
    NothingEligible {
        open: usize,
    },
    Acted {
        tab_id: TabId,
        label: String,
        action: ActionMode,
        /// False when the history entry was dropped as a duplicate.
        recorded: bool,
        counters: Counters,
    },
}

impl fmt::Display for SweepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepOutcome::Disabled => write!(f, "disabled"),
            SweepOutcome::WithinLimit { open, limit } => {
                write!(f, "tab count ({open}) is within limit ({limit})")
            }
            SweepOutcome::NothingEligible { open } => {
                write!(f, "{open} tabs open, none eligible")
            }
            SweepOutcome::Acted {
                tab_id,
                label,
                action,
                ..
            } => {
                let verb = match action {
                    ActionMode::Suspend => "suspended",
                    ActionMode::Close => "closed",
                };
                write!(f, "{verb} tab {tab_id} \"{label}\"")
            }
        }
    }
}

pub struct Sweeper {
    state: StateStore,
    host: Arc<dyn TabHost>,
}

impl Sweeper {
    pub fn new(state: StateStore, host: Arc<dyn TabHost>) -> Self {
        Self { state, host }
    }

    /// Run a sweep now. Any failure is logged and the cycle abandoned.
    pub async fn run_once(&self) -> Option<SweepOutcome> {
        match self.sweep_at(now_ms()).await {
            Ok(outcome) => {
                tracing::info!(%outcome, "sweep finished");
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "sweep aborted");
                None
            }
        }
    }

    /// Run a sweep as of `now`, propagating the first failure.
    pub async fn sweep_at(&self, now: Millis) -> Result<SweepOutcome> {
        let settings = self.state.settings().context("loading settings")?;
        if !settings.enabled {
            return Ok(SweepOutcome::Disabled);
        }

        let tabs = self.host.query().await.context("listing tabs")?;
        if tabs.len() <= settings.tab_limit as usize {
            return Ok(SweepOutcome::WithinLimit {
                open: tabs.len(),
                limit: settings.tab_limit,
            });
        }

        let ledger = self.state.ledger().context("loading tab timestamps")?;
        let candidates = eligible_tabs(&tabs, &settings, &ledger, now);
        let Some(target) = select_oldest(&candidates) else {
            return Ok(SweepOutcome::NothingEligible { open: tabs.len() });
        };
        let tab = target.tab.clone();
        tracing::info!(
            tab_id = tab.id,
            label = tab.label(),
            idle_ms = now.saturating_sub(target.last_active),
            "handling tab"
        );

        match settings.action {
            ActionMode::Suspend => self
                .host
                .discard(tab.id)
                .await
                .with_context(|| format!("discarding tab {}", tab.id))?,
            ActionMode::Close => self
                .host
                .remove(tab.id)
                .await
                .with_context(|| format!("closing tab {}", tab.id))?,
        }

        let counters = self
            .state
            .bump_counter(settings.action)
            .context("updating counters")?;

        if settings.action == ActionMode::Close {
            self.state
                .update_ledger(|l| l.forget(tab.id))
                .context("dropping closed tab timestamp")?;
        }

        let entry = HistoryEntry::for_action(&tab, settings.action, now);
        let recorded = self
            .state
            .record_history(entry)
            .context("recording history")?;
        if !recorded {
            tracing::warn!(tab_id = tab.id, "skipping duplicate history entry");
        }

        Ok(SweepOutcome::Acted {
            tab_id: tab.id,
            label: tab.label().to_string(),
            action: settings.action,
            recorded,
            counters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quidle_core::{Settings, TabSnapshot, HISTORY_CAP};
    use quidle_host::{HostCall, MemoryHost};
    use quidle_store::{KvStore, MemoryStore};
    use serde_json::json;

    const MIN: Millis = 60_000;
    const NOW: Millis = 1_700_000_000_000;

    struct Fixture {
        kv: Arc<MemoryStore>,
        state: StateStore,
        host: Arc<MemoryHost>,
        sweeper: Sweeper,
    }

    fn fixture(settings: Settings, tabs: Vec<(TabSnapshot, Option<i64>)>) -> Fixture {
        let kv = Arc::new(MemoryStore::new());
        let state = StateStore::new(kv.clone());
        state.save_settings(&settings).unwrap();
        let host = Arc::new(MemoryHost::new());
        for (tab, idle_min) in tabs {
            if let Some(idle) = idle_min {
                state.update_ledger(|l| l.touch(tab.id, NOW - idle * MIN)).unwrap();
            }
            host.insert(tab);
        }
        let sweeper = Sweeper::new(state.clone(), host.clone());
        Fixture {
            kv,
            state,
            host,
            sweeper,
        }
    }

    fn settings(limit: u32, minutes: u32, action: ActionMode) -> Settings {
        Settings {
            tab_limit: limit,
            inactivity_minutes: minutes,
            whitelist: vec!["youtube.com".into()],
            enabled: true,
            action,
        }
    }

    fn tab(id: TabId, url: &str) -> TabSnapshot {
        TabSnapshot {
            title: Some(format!("Tab {id}")),
            ..TabSnapshot::new(id, url)
        }
    }

    #[tokio::test]
    async fn over_limit_discards_longest_idle_tab() {
        let a = TabSnapshot {
            active: true,
            ..tab(1, "https://a.test/")
        };
        let f = fixture(
            settings(2, 60, ActionMode::Suspend),
            vec![
                (a, Some(0)),
                (tab(2, "https://b.test/"), Some(70)),
                (tab(3, "https://c.test/"), Some(10)),
            ],
        );

        let outcome = f.sweeper.sweep_at(NOW).await.unwrap();
        assert!(matches!(
            outcome,
            SweepOutcome::Acted {
                tab_id: 2,
                action: ActionMode::Suspend,
                recorded: true,
                ..
            }
        ));
        assert_eq!(f.host.calls(), vec![HostCall::Discard(2)]);
        assert_eq!(f.state.counters().unwrap().total_discarded, 1);

        let history = f.state.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.get(0).unwrap().tab_id, Some(2));
        // Suspended tabs keep their timestamp.
        assert!(f.state.ledger().unwrap().get(2).is_some());
    }

    #[tokio::test]
    async fn close_mode_removes_and_forgets() {
        let f = fixture(
            settings(1, 60, ActionMode::Close),
            vec![
                (tab(1, "https://a.test/"), Some(90)),
                (tab(2, "https://b.test/"), Some(120)),
            ],
        );
        let outcome = f.sweeper.sweep_at(NOW).await.unwrap();
        assert!(matches!(
            outcome,
            SweepOutcome::Acted {
                tab_id: 2,
                action: ActionMode::Close,
                ..
            }
        ));
        assert_eq!(f.host.calls(), vec![HostCall::Remove(2)]);
        assert_eq!(f.host.tabs().len(), 1);
        assert_eq!(
            f.state.counters().unwrap(),
            Counters {
                total_discarded: 0,
                total_closed: 1
            }
        );
        assert!(f.state.ledger().unwrap().get(2).is_none());
        assert_eq!(f.state.history().unwrap().get(0).unwrap().tab_id, None);
    }

    #[tokio::test]
    async fn within_limit_does_nothing() {
        let f = fixture(
            settings(3, 1, ActionMode::Close),
            vec![
                (tab(1, "https://a.test/"), Some(1_000)),
                (tab(2, "https://b.test/"), Some(1_000)),
                (tab(3, "https://c.test/"), Some(1_000)),
            ],
        );
        let outcome = f.sweeper.sweep_at(NOW).await.unwrap();
        assert_eq!(outcome, SweepOutcome::WithinLimit { open: 3, limit: 3 });
        assert!(f.host.calls().is_empty());
        assert_eq!(f.state.counters().unwrap(), Counters::default());
    }

    #[tokio::test]
    async fn disabled_does_nothing() {
        let mut s = settings(1, 1, ActionMode::Close);
        s.enabled = false;
        let f = fixture(
            s,
            vec![
                (tab(1, "https://a.test/"), Some(1_000)),
                (tab(2, "https://b.test/"), Some(1_000)),
            ],
        );
        assert_eq!(f.sweeper.sweep_at(NOW).await.unwrap(), SweepOutcome::Disabled);
        assert!(f.host.calls().is_empty());
    }

    #[tokio::test]
    async fn protected_tabs_are_never_selected() {
        let f = fixture(
            settings(1, 1, ActionMode::Close),
            vec![
                (
                    TabSnapshot {
                        pinned: true,
                        ..tab(1, "https://a.test/")
                    },
                    Some(1_000),
                ),
                (
                    TabSnapshot {
                        audible: true,
                        ..tab(2, "https://b.test/")
                    },
                    Some(1_000),
                ),
                (tab(3, "https://music.youtube.com/"), Some(1_000)),
                (tab(4, "https://fresh.test/"), None),
            ],
        );
        let outcome = f.sweeper.sweep_at(NOW).await.unwrap();
        assert_eq!(outcome, SweepOutcome::NothingEligible { open: 4 });
        assert!(f.host.calls().is_empty());
    }

    #[tokio::test]
    async fn host_failure_aborts_without_counting() {
        let f = fixture(
            settings(1, 1, ActionMode::Suspend),
            vec![
                (tab(1, "https://a.test/"), Some(100)),
                (tab(2, "https://b.test/"), Some(100)),
            ],
        );
        f.host.set_failing(true);
        assert!(f.sweeper.sweep_at(NOW).await.is_err());
        assert!(f.sweeper.run_once().await.is_none());
        assert_eq!(f.state.counters().unwrap(), Counters::default());
        assert!(f.state.history().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_swallowed_by_run_once() {
        let f = fixture(settings(1, 1, ActionMode::Suspend), vec![]);
        f.kv.set_failing(true);
        assert!(f.sweeper.run_once().await.is_none());
    }

    #[tokio::test]
    async fn extreme_stored_timestamps_do_not_abort_the_sweep() {
        let a = TabSnapshot {
            active: true,
            ..tab(1, "https://a.test/")
        };
        let f = fixture(settings(1, 1, ActionMode::Close), vec![(a, None)]);
        f.host.insert(tab(2, "https://b.test/"));
        let mut items = quidle_store::KvMap::new();
        items.insert("tabTimestamps".into(), json!({ "2": i64::MIN }));
        items.insert(
            "closedTabsHistory".into(),
            json!([{ "url": "https://b.test/", "closedAt": i64::MIN }]),
        );
        f.kv.set(items).unwrap();

        let outcome = f.sweeper.run_once().await;
        assert!(matches!(
            outcome,
            Some(SweepOutcome::Acted {
                tab_id: 2,
                recorded: true,
                ..
            })
        ));
        assert_eq!(f.state.history().unwrap().len(), 2);
        assert_eq!(f.state.counters().unwrap().total_closed, 1);
    }

    #[tokio::test]
    async fn repeated_sweeps_keep_history_bounded() {
        let tabs = (1..=30)
            .map(|id| (tab(id, &format!("https://{id}.test/")), Some(100 + id)))
            .collect();
        let f = fixture(settings(1, 1, ActionMode::Close), tabs);

        let mut closed = 0;
        for i in 0..40 {
            let outcome = f.sweeper.sweep_at(NOW + i * 10_000).await.unwrap();
            if matches!(outcome, SweepOutcome::Acted { .. }) {
                closed += 1;
            }
            assert!(f.state.history().unwrap().len() <= HISTORY_CAP);
        }
        assert_eq!(closed, 29);
        assert_eq!(f.state.counters().unwrap().total_closed, 29);
        assert_eq!(f.host.tabs().len(), 1);
        // Oldest first: tab 30 went first, tab 2 last.
        assert_eq!(f.state.history().unwrap().get(0).unwrap().url, "https://2.test/");
    }
}
