use crate::{HostError, TabHost, TabStrip};
use quidle_core::{TabId, TabSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A mutating call received by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Discard(TabId),
    Remove(TabId),
    Activate(TabId),
    Create(String),
}

/// In-process tab strip that records every mutating call.
#[derive(Debug, Default)]
pub struct MemoryHost {
    strip: Mutex<TabStrip>,
    calls: Mutex<Vec<HostCall>>,
    failing: AtomicBool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tabs(tabs: impl IntoIterator<Item = TabSnapshot>) -> Self {
        let host = Self::new();
        for tab in tabs {
            host.insert(tab);
        }
        host
    }

    pub fn insert(&self, tab: TabSnapshot) {
        self.lock_strip().insert(tab);
    }

    /// Make every mutating call fail with [`HostError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn tabs(&self) -> Vec<TabSnapshot> {
        self.lock_strip().tabs.clone()
    }

    fn lock_strip(&self) -> MutexGuard<'_, TabStrip> {
        self.strip.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: HostCall) -> Result<(), HostError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable(format!("{call:?} refused")));
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TabHost for MemoryHost {
    async fn query(&self) -> Result<Vec<TabSnapshot>, HostError> {
        Ok(self.tabs())
    }

    async fn get(&self, tab_id: TabId) -> Result<TabSnapshot, HostError> {
        self.lock_strip().find(tab_id).cloned()
    }

    async fn discard(&self, tab_id: TabId) -> Result<(), HostError> {
        self.record(HostCall::Discard(tab_id))?;
        self.lock_strip().discard(tab_id)
    }

    async fn remove(&self, tab_id: TabId) -> Result<(), HostError> {
        self.record(HostCall::Remove(tab_id))?;
        self.lock_strip().remove(tab_id).map(|_| ())
    }

    async fn activate(&self, tab_id: TabId) -> Result<(), HostError> {
        self.record(HostCall::Activate(tab_id))?;
        self.lock_strip().activate(tab_id)
    }

    async fn create(&self, url: &str) -> Result<TabSnapshot, HostError> {
        self.record(HostCall::Create(url.to_string()))?;
        let template = TabSnapshot {
            active: true,
            ..TabSnapshot::new(0, url)
        };
        Ok(self.lock_strip().open(template))
    }
}
