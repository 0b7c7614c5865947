//! Applies the effects produced by [`quidle_core::dispatch`].
//!
//! The dispatcher decides; this module is the only place that touches
//! storage or the host in response to an event. Failures are logged and
//! swallowed so one bad event never takes the process down.

use crate::sweeper::{SweepOutcome, Sweeper};
use anyhow::{Context, Result};
use quidle_core::{dispatch, now_ms, AlarmSpec, Effect, Millis, TabEvent, TabId, CHECK_TABS_ALARM};
use quidle_host::TabHost;
use quidle_store::StateStore;
use std::sync::Arc;

/// What handling one event amounted to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Handled {
    pub effects: Vec<Effect>,
    pub sweep: Option<SweepOutcome>,
}

pub struct Runtime {
    state: StateStore,
    host: Arc<dyn TabHost>,
    sweeper: Sweeper,
}

impl Runtime {
    pub fn new(state: StateStore, host: Arc<dyn TabHost>) -> Self {
        let sweeper = Sweeper::new(state.clone(), host.clone());
        Self {
            state,
            host,
            sweeper,
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn host(&self) -> &Arc<dyn TabHost> {
        &self.host
    }

    pub fn sweeper(&self) -> &Sweeper {
        &self.sweeper
    }

    pub async fn handle(&self, event: TabEvent) -> Handled {
        self.handle_at(event, now_ms()).await
    }

    /// Dispatch `event` against the stored ledger and apply its effects.
    pub async fn handle_at(&self, event: TabEvent, now: Millis) -> Handled {
        tracing::debug!(?event, "handling event");
        let mut effects = Vec::new();
        let updated = self.state.update_ledger(|ledger| {
            let transition = dispatch(&event, std::mem::take(ledger), now);
            *ledger = transition.ledger;
            effects = transition.effects;
            effects.contains(&Effect::PersistLedger)
        });
        if let Err(e) = updated {
            tracing::error!(?event, error = %e, "failed to update tab timestamps");
            return Handled::default();
        }

        let mut handled = Handled::default();
        for effect in &effects {
            match effect {
                // Written inside update_ledger above.
                Effect::PersistLedger => {}
                Effect::RunSweep => handled.sweep = self.sweeper.run_once().await,
                Effect::ApplyDefaults => self.apply_defaults(),
                Effect::ScheduleAlarm(spec) => self.schedule(*spec),
                Effect::TouchAllOpenTabs => {
                    if let Err(e) = self.touch_all(now).await {
                        tracing::error!(
                            error = %format!("{e:#}"),
                            "failed to record initial tab timestamps"
                        );
                    }
                }
            }
        }
        handled.effects = effects;
        handled
    }

    /// Record activity on `tab_id`.
    pub async fn touch(&self, tab_id: TabId) -> Handled {
        self.handle(TabEvent::TabActivated { tab_id }).await
    }

    /// Drop the timestamp of a closed tab.
    pub async fn forget(&self, tab_id: TabId) -> Handled {
        self.handle(TabEvent::TabRemoved { tab_id }).await
    }

    fn apply_defaults(&self) {
        match self.state.apply_defaults() {
            Ok(keys) if keys.is_empty() => tracing::info!("all settings already present"),
            Ok(keys) => tracing::info!(?keys, "default settings applied for missing values"),
            Err(e) => tracing::error!(error = %e, "failed to apply default settings"),
        }
    }

    fn schedule(&self, spec: AlarmSpec) {
        match self.state.save_alarm(CHECK_TABS_ALARM, spec) {
            Ok(()) => tracing::info!(
                alarm = CHECK_TABS_ALARM,
                delay_secs = spec.delay.as_secs(),
                period_secs = spec.period.as_secs(),
                "alarm created"
            ),
            Err(e) => tracing::error!(error = %e, "failed to create alarm"),
        }
    }

    async fn touch_all(&self, now: Millis) -> Result<usize> {
        let tabs = self.host.query().await.context("listing tabs")?;
        let mut touched = 0;
        let mut pruned = 0;
        self.state
            .update_ledger(|ledger| {
                pruned = ledger.retain_tabs(|id| tabs.iter().any(|t| t.id == id));
                for tab in &tabs {
                    if ledger.touch(tab.id, now) {
                        touched += 1;
                    }
                }
                touched > 0 || pruned > 0
            })
            .context("saving tab timestamps")?;
        tracing::info!(touched, pruned, "initial tab timestamps recorded");
        Ok(touched)
    }
}
