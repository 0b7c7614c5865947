//! Host lifecycle events mapped to ledger changes and side effects.
//!
//! `dispatch` is pure: it takes the current ledger and returns the new one
//! plus the effects the runtime must carry out. Persistence happens only when
//! the runtime applies [`Effect::PersistLedger`].

use crate::ledger::TimestampLedger;
use crate::types::{Millis, TabId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the periodic alarm that triggers a sweep.
pub const CHECK_TABS_ALARM: &str = "checkTabsAlarm";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabEvent {
    /// Install or update of the process.
    Installed,
    Alarm {
        name: String,
    },
    TabActivated {
        tab_id: TabId,
    },
    TabCreated {
        tab_id: TabId,
    },
    TabUpdated {
        tab_id: TabId,
        #[serde(default)]
        url_changed: bool,
        #[serde(default)]
        status_complete: bool,
    },
    TabRemoved {
        tab_id: TabId,
    },
}

/// Periodic alarm schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSpec {
    pub delay: Duration,
    pub period: Duration,
}

impl Default for AlarmSpec {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            period: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PersistLedger,
    RunSweep,
    ApplyDefaults,
    ScheduleAlarm(AlarmSpec),
    TouchAllOpenTabs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub ledger: TimestampLedger,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(ledger: TimestampLedger) -> Self {
        Self {
            ledger,
            effects: Vec::new(),
        }
    }

    fn persisted(ledger: TimestampLedger) -> Self {
        Self {
            ledger,
            effects: vec![Effect::PersistLedger],
        }
    }

    pub fn has(&self, effect: &Effect) -> bool {
        self.effects.contains(effect)
    }
}

/// Route one event to its handler.
pub fn dispatch(event: &TabEvent, ledger: TimestampLedger, now: Millis) -> Transition {
    match event {
        TabEvent::Installed => on_installed(ledger),
        TabEvent::Alarm { name } => on_alarm(name, ledger),
        TabEvent::TabActivated { tab_id } | TabEvent::TabCreated { tab_id } => {
            touch(*tab_id, ledger, now)
        }
        TabEvent::TabUpdated {
            tab_id,
            url_changed,
            status_complete,
        } => {
            // Title/favicon/loading churn does not count as activity.
            if *url_changed || *status_complete {
                touch(*tab_id, ledger, now)
            } else {
                Transition::unchanged(ledger)
            }
        }
        TabEvent::TabRemoved { tab_id } => forget(*tab_id, ledger),
    }
}

fn on_installed(ledger: TimestampLedger) -> Transition {
    Transition {
        ledger,
        effects: vec![
            Effect::ApplyDefaults,
            Effect::ScheduleAlarm(AlarmSpec::default()),
            Effect::TouchAllOpenTabs,
        ],
    }
}

fn on_alarm(name: &str, ledger: TimestampLedger) -> Transition {
    if name == CHECK_TABS_ALARM {
        Transition {
            ledger,
            effects: vec![Effect::RunSweep],
        }
    } else {
        Transition::unchanged(ledger)
    }
}

fn touch(tab_id: TabId, mut ledger: TimestampLedger, now: Millis) -> Transition {
    if ledger.touch(tab_id, now) {
        Transition::persisted(ledger)
    } else {
        Transition::unchanged(ledger)
    }
}

fn forget(tab_id: TabId, mut ledger: TimestampLedger) -> Transition {
    if ledger.forget(tab_id) {
        Transition::persisted(ledger)
    } else {
        Transition::unchanged(ledger)
    }
}
