//! Settings, history and statistics operations behind the viewer surface.

use crate::runtime::Runtime;
use anyhow::{Context, Result};
use quidle_core::{Counters, History, HistoryEntry, Settings, SettingsForm, TabEvent, TabId};
use std::fmt;

/// Everything the viewer shows at once.
#[derive(Debug, Clone)]
pub struct Overview {
    pub settings: Settings,
    pub history: History,
    pub counters: Counters,
    pub open_tabs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReopenOutcome {
    /// The suspended tab was still open and is now active again.
    Reactivated(TabId),
    /// Another open tab with the same URL was focused.
    FocusedExisting(TabId),
    /// A new tab was opened at the URL.
    Created(TabId),
}

impl fmt::Display for ReopenOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReopenOutcome::Reactivated(_) => write!(f, "Tab reactivated!"),
            ReopenOutcome::FocusedExisting(_) => write!(f, "Existing tab activated!"),
            ReopenOutcome::Created(_) => write!(f, "New tab created!"),
        }
    }
}

pub struct Viewer<'a> {
    runtime: &'a Runtime,
}

impl<'a> Viewer<'a> {
    pub fn new(runtime: &'a Runtime) -> Self {
        Self { runtime }
    }

    pub async fn overview(&self) -> Result<Overview> {
        Ok(Overview {
            settings: self.settings()?,
            history: self.history()?,
            counters: self.counters()?,
            open_tabs: self.open_tab_count().await?,
        })
    }

    pub fn settings(&self) -> Result<Settings> {
        self.runtime
            .state()
            .settings()
            .context("Failed to load settings.")
    }

    /// Validate and store `form`. Returns the stored settings.
    pub fn save_settings(&self, form: &SettingsForm) -> Result<Settings> {
        let settings = form.validate()?;
        self.runtime
            .state()
            .save_settings(&settings)
            .context("Failed to save settings.")?;
        tracing::info!(?settings, "settings saved");
        Ok(settings)
    }

    pub fn history(&self) -> Result<History> {
        self.runtime
            .state()
            .history()
            .context("Failed to load history.")
    }

    pub fn clear_history(&self) -> Result<()> {
        self.runtime
            .state()
            .clear_history()
            .context("Failed to clear history.")
    }

    pub fn counters(&self) -> Result<Counters> {
        self.runtime
            .state()
            .counters()
            .context("Failed to load stats.")
    }

    pub fn clear_counters(&self) -> Result<()> {
        self.runtime
            .state()
            .clear_counters()
            .context("Failed to clear stats.")
    }

    pub async fn open_tab_count(&self) -> Result<usize> {
        let tabs = self
            .runtime
            .host()
            .query()
            .await
            .context("Failed to load tab count.")?;
        Ok(tabs.len())
    }

    /// Reopen the history entry at `index` (0 = newest).
    pub async fn reopen_index(&self, index: usize) -> Result<ReopenOutcome> {
        let history = self.history()?;
        let entry = history
            .get(index)
            .with_context(|| format!("no history entry at index {index}"))?;
        self.reopen(entry).await
    }

    /// Bring a handled tab back: reactivate the original suspended tab if it
    /// is still there, else focus a tab already showing the URL, else open a
    /// new one.
    pub async fn reopen(&self, entry: &HistoryEntry) -> Result<ReopenOutcome> {
        let host = self.runtime.host();

        if let Some(tab_id) = entry.tab_id {
            match host.get(tab_id).await {
                Ok(tab) if tab.discarded => {
                    host.activate(tab_id).await?;
                    self.runtime.handle(TabEvent::TabActivated { tab_id }).await;
                    return Ok(ReopenOutcome::Reactivated(tab_id));
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(tab_id, error = %e, "original tab not available"),
            }
        }

        let url = entry.display_url();
        let existing = host.query_url(url).await?;
        if let Some(tab) = existing.first() {
            host.activate(tab.id).await?;
            self.runtime
                .handle(TabEvent::TabActivated { tab_id: tab.id })
                .await;
            return Ok(ReopenOutcome::FocusedExisting(tab.id));
        }

        let created = host.create(url).await?;
        self.runtime
            .handle(TabEvent::TabCreated { tab_id: created.id })
            .await;
        Ok(ReopenOutcome::Created(created.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quidle_core::{ActionMode, SettingsError, TabSnapshot};
    use quidle_host::{HostCall, MemoryHost};
    use quidle_store::{MemoryStore, StateStore};
    use std::sync::Arc;

    fn runtime(tabs: Vec<TabSnapshot>) -> (Arc<MemoryHost>, Runtime) {
        let host = Arc::new(MemoryHost::with_tabs(tabs));
        let state = StateStore::new(Arc::new(MemoryStore::new()));
        (host.clone(), Runtime::new(state, host))
    }

    fn entry(url: &str, tab_id: Option<TabId>) -> HistoryEntry {
        HistoryEntry {
            url: url.into(),
            title: "x".into(),
            fav_icon_url: String::new(),
            closed_at: 0,
            tab_id,
        }
    }

    #[test]
    fn save_settings_validates_and_stores() {
        let (_, rt) = runtime(vec![]);
        let viewer = Viewer::new(&rt);
        let form = SettingsForm {
            tab_limit: "8".into(),
            inactivity_minutes: "30".into(),
            whitelist: "a.com, b.com".into(),
            enabled: true,
            action: "close".into(),
        };
        let saved = viewer.save_settings(&form).unwrap();
        assert_eq!(saved.action, ActionMode::Close);
        assert_eq!(viewer.settings().unwrap(), saved);

        let bad = SettingsForm {
            tab_limit: "0".into(),
            ..form
        };
        let err = viewer.save_settings(&bad).unwrap_err();
        assert_eq!(err.downcast_ref::<SettingsError>(), Some(&SettingsError::TabLimit));
        assert_eq!(viewer.settings().unwrap(), saved);
    }

    #[test]
    fn clearing_counters_zeroes_both() {
        let (_, rt) = runtime(vec![]);
        let state = rt.state();
        for _ in 0..3 {
            state.bump_counter(ActionMode::Suspend).unwrap();
        }
        state.bump_counter(ActionMode::Close).unwrap();
        let viewer = Viewer::new(&rt);
        viewer.clear_counters().unwrap();
        assert_eq!(viewer.counters().unwrap(), Counters::default());
    }

    #[tokio::test]
    async fn overview_reports_live_tab_count() {
        let (_, rt) = runtime(vec![
            TabSnapshot::new(1, "https://a.test/"),
            TabSnapshot::new(2, "https://b.test/"),
        ]);
        let overview = Viewer::new(&rt).overview().await.unwrap();
        assert_eq!(overview.open_tabs, 2);
        assert!(overview.history.is_empty());
    }

    #[tokio::test]
    async fn reopen_reactivates_suspended_original() {
        let (host, rt) = runtime(vec![TabSnapshot {
            discarded: true,
            ..TabSnapshot::new(4, "https://a.test/")
        }]);
        let outcome = Viewer::new(&rt)
            .reopen(&entry("https://a.test/", Some(4)))
            .await
            .unwrap();
        assert_eq!(outcome, ReopenOutcome::Reactivated(4));
        assert_eq!(host.calls(), vec![HostCall::Activate(4)]);
        assert!(rt.state().ledger().unwrap().get(4).is_some());
    }

    #[tokio::test]
    async fn reopen_focuses_tab_with_same_url() {
        let (host, rt) = runtime(vec![TabSnapshot::new(9, "https://a.test/")]);
        // Original tab 4 is gone.
        let outcome = Viewer::new(&rt)
            .reopen(&entry("https://a.test/", Some(4)))
            .await
            .unwrap();
        assert_eq!(outcome, ReopenOutcome::FocusedExisting(9));
        assert_eq!(host.calls(), vec![HostCall::Activate(9)]);
    }

    #[tokio::test]
    async fn reopen_creates_when_nothing_matches() {
        let (host, rt) = runtime(vec![TabSnapshot::new(1, "https://other.test/")]);
        rt.state()
            .record_history(entry("https://gone.test/", None))
            .unwrap();
        let outcome = Viewer::new(&rt).reopen_index(0).await.unwrap();
        assert_eq!(outcome, ReopenOutcome::Created(2));
        assert_eq!(host.calls(), vec![HostCall::Create("https://gone.test/".into())]);
        assert_eq!(rt.state().ledger().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reopen_missing_index_errors() {
        let (_, rt) = runtime(vec![]);
        assert!(Viewer::new(&rt).reopen_index(3).await.is_err());
    }
}
