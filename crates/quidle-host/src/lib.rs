pub mod file;
pub mod memory;
pub mod strip;

pub use file::FileHost;
pub use memory::{HostCall, MemoryHost};
pub use strip::TabStrip;

use quidle_core::{TabId, TabSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no tab with id {0}")]
    NoSuchTab(TabId),
    #[error("tab {tab_id} cannot be {action}: {reason}")]
    Rejected {
        tab_id: TabId,
        action: &'static str,
        reason: String,
    },
    #[error("tab host unavailable: {0}")]
    Unavailable(String),
}

/// Tab operations provided by the browser. Every call may suspend.
#[async_trait::async_trait]
pub trait TabHost: Send + Sync {
    /// All open tabs, in strip order.
    async fn query(&self) -> Result<Vec<TabSnapshot>, HostError>;

    async fn get(&self, tab_id: TabId) -> Result<TabSnapshot, HostError>;

    /// Unload the tab's content, keeping it in the strip.
    async fn discard(&self, tab_id: TabId) -> Result<(), HostError>;

    async fn remove(&self, tab_id: TabId) -> Result<(), HostError>;

    /// Make the tab the active one (reloading it if discarded).
    async fn activate(&self, tab_id: TabId) -> Result<(), HostError>;

    /// Open a new active tab at `url`.
    async fn create(&self, url: &str) -> Result<TabSnapshot, HostError>;

    /// Open tabs whose URL equals `url`.
    async fn query_url(&self, url: &str) -> Result<Vec<TabSnapshot>, HostError> {
        Ok(self
            .query()
            .await?
            .into_iter()
            .filter(|t| t.url.as_deref() == Some(url))
            .collect())
    }
}
