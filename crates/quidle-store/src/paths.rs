use std::path::{Path, PathBuf};

/// All well-known paths under `.quidle/`.
#[derive(Debug, Clone)]
pub struct QuidlePaths {
    pub root: PathBuf,
    pub quidle_dir: PathBuf,
    pub storage_json: PathBuf,
    pub tabs_json: PathBuf,
    pub lock_file: PathBuf,
}

impl QuidlePaths {
    /// Derive all paths from a data root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let quidle_dir = root.join(".quidle");
        Self {
            storage_json: quidle_dir.join("storage.json"),
            tabs_json: quidle_dir.join("tabs.json"),
            lock_file: quidle_dir.join("LOCK"),
            quidle_dir,
            root,
        }
    }

    /// Create the `.quidle/` directory. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.quidle_dir)?;
        Ok(())
    }

    /// Check whether `.quidle/` exists.
    pub fn is_initialized(&self) -> bool {
        self.quidle_dir.is_dir()
    }

    /// Walk up from `start` looking for a directory containing `.quidle/`.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(".quidle").is_dir())
            .map(Path::to_path_buf)
    }
}
