use crate::HostError;
use quidle_core::{TabId, TabSnapshot};
use serde::{Deserialize, Serialize};

/// An ordered set of open tabs in a single window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabStrip {
    #[serde(default = "first_id")]
    pub next_id: TabId,
    #[serde(default)]
    pub tabs: Vec<TabSnapshot>,
}

fn first_id() -> TabId {
    1
}

impl Default for TabStrip {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            tabs: Vec::new(),
        }
    }
}

impl TabStrip {
    pub fn find(&self, tab_id: TabId) -> Result<&TabSnapshot, HostError> {
        self.tabs
            .iter()
            .find(|t| t.id == tab_id)
            .ok_or(HostError::NoSuchTab(tab_id))
    }

    fn find_mut(&mut self, tab_id: TabId) -> Result<&mut TabSnapshot, HostError> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or(HostError::NoSuchTab(tab_id))
    }

    /// Append a tab built from `template`, assigning the next id. The new tab
    /// becomes active when `template.active` is set.
    pub fn open(&mut self, template: TabSnapshot) -> TabSnapshot {
        let mut tab = template;
        tab.id = self.next_id;
        self.next_id += 1;
        if tab.active {
            for other in &mut self.tabs {
                other.active = false;
            }
        }
        self.tabs.push(tab.clone());
        tab
    }

    /// Insert a tab keeping its id. Replaces any tab with the same id.
    pub fn insert(&mut self, tab: TabSnapshot) {
        self.next_id = self.next_id.max(tab.id + 1);
        match self.tabs.iter_mut().find(|t| t.id == tab.id) {
            Some(existing) => *existing = tab,
            None => self.tabs.push(tab),
        }
    }

    pub fn activate(&mut self, tab_id: TabId) -> Result<(), HostError> {
        self.find(tab_id)?;
        for tab in &mut self.tabs {
            tab.active = tab.id == tab_id;
            if tab.active {
                tab.discarded = false;
            }
        }
        Ok(())
    }

    pub fn discard(&mut self, tab_id: TabId) -> Result<(), HostError> {
        let tab = self.find_mut(tab_id)?;
        if tab.active {
            return Err(HostError::Rejected {
                tab_id,
                action: "discarded",
                reason: "tab is active".into(),
            });
        }
        tab.discarded = true;
        Ok(())
    }

    pub fn remove(&mut self, tab_id: TabId) -> Result<TabSnapshot, HostError> {
        let pos = self
            .tabs
            .iter()
            .position(|t| t.id == tab_id)
            .ok_or(HostError::NoSuchTab(tab_id))?;
        Ok(self.tabs.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_with(n: usize) -> TabStrip {
        let mut strip = TabStrip::default();
        for i in 0..n {
            strip.open(TabSnapshot::new(0, &format!("https://{i}.test/")));
        }
        strip
    }

    #[test]
    fn open_assigns_increasing_ids() {
        let strip = strip_with(3);
        let ids: Vec<_> = strip.tabs.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(strip.next_id, 4);
    }

    #[test]
    fn insert_keeps_id_and_bumps_next() {
        let mut strip = TabStrip::default();
        strip.insert(TabSnapshot::new(40, "https://a.test/"));
        strip.insert(TabSnapshot::new(40, "https://b.test/"));
        assert_eq!(strip.tabs.len(), 1);
        assert_eq!(strip.find(40).unwrap().url.as_deref(), Some("https://b.test/"));
        assert_eq!(strip.open(TabSnapshot::default()).id, 41);
    }

    #[test]
    fn activate_is_exclusive_and_reloads() {
        let mut strip = strip_with(2);
        strip.discard(1).unwrap();
        strip.activate(1).unwrap();
        strip.activate(2).unwrap();
        let t1 = strip.find(1).unwrap();
        assert!(!t1.active);
        assert!(!t1.discarded);
        assert!(strip.find(2).unwrap().active);
    }

    #[test]
    fn active_tab_cannot_be_discarded() {
        let mut strip = strip_with(1);
        strip.activate(1).unwrap();
        assert!(matches!(strip.discard(1), Err(HostError::Rejected { .. })));
    }

    #[test]
    fn remove_missing_tab_errors() {
        let mut strip = strip_with(1);
        assert!(strip.remove(1).is_ok());
        assert!(matches!(strip.remove(1), Err(HostError::NoSuchTab(1))));
    }
}
