//! Tab strip persisted in `.quidle/tabs.json`, so separate CLI invocations
//! see the same set of tabs.

use crate::{HostError, TabHost, TabStrip};
use quidle_core::{TabId, TabSnapshot};
use quidle_store::QuidlePaths;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileHost {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileHost {
    pub fn open(paths: &QuidlePaths) -> Self {
        Self {
            path: paths.tabs_json.clone(),
            lock_path: paths.quidle_dir.join("tabs.lock"),
        }
    }

    /// Load the strip. A missing file is an empty strip.
    pub fn load(&self) -> Result<TabStrip, HostError> {
        let _guard = self.lock()?;
        self.read()
    }

    /// Run `f` against the strip under the lock and write it back.
    pub fn with_strip<T>(
        &self,
        f: impl FnOnce(&mut TabStrip) -> Result<T, HostError>,
    ) -> Result<T, HostError> {
        let _guard = self.lock()?;
        let mut strip = self.read()?;
        let out = f(&mut strip)?;
        let json = serde_json::to_string_pretty(&strip)
            .map_err(|e| HostError::Unavailable(format!("encoding tab strip: {e}")))?;
        quidle_store::write_atomic(&self.path, json.as_bytes())
            .map_err(|e| HostError::Unavailable(format!("writing {}: {e}", self.path.display())))?;
        Ok(out)
    }

    fn lock(&self) -> Result<quidle_store::LockGuard, HostError> {
        quidle_store::lock_file(&self.lock_path).map_err(|e| {
            HostError::Unavailable(format!("locking {}: {e}", self.lock_path.display()))
        })
    }

    fn read(&self) -> Result<TabStrip, HostError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                HostError::Unavailable(format!("parsing {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TabStrip::default()),
            Err(e) => Err(HostError::Unavailable(format!(
                "reading {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl TabHost for FileHost {
    async fn query(&self) -> Result<Vec<TabSnapshot>, HostError> {
        Ok(self.load()?.tabs)
    }

    async fn get(&self, tab_id: TabId) -> Result<TabSnapshot, HostError> {
        self.load()?.find(tab_id).cloned()
    }

    async fn discard(&self, tab_id: TabId) -> Result<(), HostError> {
        self.with_strip(|s| s.discard(tab_id))
    }

    async fn remove(&self, tab_id: TabId) -> Result<(), HostError> {
        self.with_strip(|s| s.remove(tab_id).map(|_| ()))
    }

    async fn activate(&self, tab_id: TabId) -> Result<(), HostError> {
        self.with_strip(|s| s.activate(tab_id))
    }

    async fn create(&self, url: &str) -> Result<TabSnapshot, HostError> {
        let template = TabSnapshot {
            active: true,
            ..TabSnapshot::new(0, url)
        };
        self.with_strip(|s| Ok(s.open(template)))
    }
}
