use serde::{Deserialize, Serialize};

/// Host-assigned tab identifier.
pub type TabId = i64;

/// Sentinel the host uses for "no tab" (e.g. devtools windows).
pub const TAB_ID_NONE: TabId = -1;

/// Epoch milliseconds.
pub type Millis = i64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> Millis {
    let now = time::OffsetDateTime::now_utc();
    (now.unix_timestamp_nanos() / 1_000_000) as Millis
}

/// Point-in-time view of one open tab, as reported by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub audible: bool,
    #[serde(default)]
    pub discarded: bool,
}

impl TabSnapshot {
    pub fn new(id: TabId, url: &str) -> Self {
        Self {
            id,
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    /// Title if set, else URL, else a placeholder. Used in log lines.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.url.as_deref())
            .unwrap_or("(untitled)")
    }
}

/// Running totals of tabs handled by the sweeper.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counters {
    pub total_discarded: u64,
    pub total_closed: u64,
}
