//! Which open tabs the sweeper may act on, and which one it picks.

use crate::ledger::TimestampLedger;
use crate::settings::Settings;
use crate::types::{Millis, TabSnapshot};
use std::fmt;

/// Why a tab was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    Discarded,
    Active,
    Pinned,
    Audible,
    MissingUrl,
    UnparseableUrl,
    Whitelisted,
    RecentlyActive,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Exclusion::Discarded => "already discarded",
            Exclusion::Active => "active",
            Exclusion::Pinned => "pinned",
            Exclusion::Audible => "playing audio",
            Exclusion::MissingUrl => "no url",
            Exclusion::UnparseableUrl => "unparseable url",
            Exclusion::Whitelisted => "whitelisted",
            Exclusion::RecentlyActive => "recently active",
        };
        f.write_str(s)
    }
}

/// An eligible tab together with the last-active instant used to rank it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub tab: TabSnapshot,
    pub last_active: Millis,
}

/// Decide whether one tab is eligible. On success returns its last-active
/// instant (unknown tabs count as active at `now`).
pub fn check_tab(
    tab: &TabSnapshot,
    settings: &Settings,
    ledger: &TimestampLedger,
    now: Millis,
) -> Result<Millis, Exclusion> {
    if tab.discarded {
        return Err(Exclusion::Discarded);
    }
    if tab.active {
        return Err(Exclusion::Active);
    }
    if tab.pinned {
        return Err(Exclusion::Pinned);
    }
    if tab.audible {
        return Err(Exclusion::Audible);
    }

    let raw = tab.url.as_deref().ok_or(Exclusion::MissingUrl)?;
    let parsed = url::Url::parse(raw).map_err(|_| Exclusion::UnparseableUrl)?;
    let host = parsed.host_str().unwrap_or("");
    if settings.is_whitelisted(host) {
        return Err(Exclusion::Whitelisted);
    }

    let last_active = ledger.last_active_or(tab.id, now);
    if now.saturating_sub(last_active) > settings.inactivity_ms() {
        Ok(last_active)
    } else {
        Err(Exclusion::RecentlyActive)
    }
}

/// Filter `tabs` down to eligible candidates, preserving host order.
pub fn eligible_tabs(
    tabs: &[TabSnapshot],
    settings: &Settings,
    ledger: &TimestampLedger,
    now: Millis,
) -> Vec<Candidate> {
    tabs.iter()
        .filter_map(|tab| match check_tab(tab, settings, ledger, now) {
            Ok(last_active) => Some(Candidate {
                tab: tab.clone(),
                last_active,
            }),
            Err(reason) => {
                if reason == Exclusion::UnparseableUrl {
                    tracing::debug!(tab_id = tab.id, url = ?tab.url, "could not parse tab url");
                } else {
                    tracing::trace!(tab_id = tab.id, %reason, "tab not eligible");
                }
                None
            }
        })
        .collect()
}

/// Oldest candidate by last-active instant; ties go to the lowest tab id.
pub fn select_oldest(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().min_by_key(|c| (c.last_active, c.tab.id))
}
