pub mod kv;
pub mod paths;
pub mod state;

pub use kv::{JsonFileStore, KvMap, KvStore, MemoryStore, StoreError};
pub use paths::QuidlePaths;
pub use state::StateStore;

use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Return the per-user data root: `<data_dir>/quidle/`
/// (falls back to `~/.quidle/`, then `./.quidle-store`).
pub fn store_root() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("quidle")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".quidle")
    } else {
        PathBuf::from(".quidle-store")
    }
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// File-based exclusive lock guard. Released on drop.
pub struct LockGuard {
    _file: fs::File,
}

/// Acquire an exclusive file lock, blocking until it is free. Creates the
/// lock file if needed.
pub fn lock_file(path: &Path) -> std::io::Result<LockGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;
    Ok(LockGuard { _file: file })
}
