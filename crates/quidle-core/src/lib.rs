pub mod eligibility;
pub mod event;
pub mod history;
pub mod ledger;
pub mod settings;
pub mod types;

pub use eligibility::{check_tab, eligible_tabs, select_oldest, Candidate, Exclusion};
pub use event::{dispatch, AlarmSpec, Effect, TabEvent, Transition, CHECK_TABS_ALARM};
pub use history::{History, HistoryEntry, DEDUP_WINDOW_MS, HISTORY_CAP};
pub use ledger::TimestampLedger;
pub use settings::{parse_whitelist, ActionMode, Settings, SettingsError, SettingsForm};
pub use types::*;
