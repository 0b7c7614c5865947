use quidle_daemon::Runtime;
use quidle_host::FileHost;
use quidle_store::{JsonFileStore, QuidlePaths, StateStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An opened data root: storage, the file-backed tab strip, and a runtime
/// wired to both.
pub struct Workspace {
    pub paths: QuidlePaths,
    pub host: Arc<FileHost>,
    pub runtime: Runtime,
}

impl Workspace {
    /// Resolve the data root: explicit `--dir`, else a `.quidle/` found by
    /// walking up from the current directory, else the per-user store.
    pub fn resolve_root(dir: Option<&Path>) -> anyhow::Result<PathBuf> {
        if let Some(dir) = dir {
            return Ok(dir.to_path_buf());
        }
        let cwd = std::env::current_dir()?;
        Ok(QuidlePaths::find_root(&cwd).unwrap_or_else(quidle_store::store_root))
    }

    pub fn open(root: &Path) -> Self {
        let paths = QuidlePaths::discover(root);
        let state = StateStore::new(Arc::new(JsonFileStore::open(&paths)));
        let host = Arc::new(FileHost::open(&paths));
        let runtime = Runtime::new(state, host.clone());
        Self {
            paths,
            host,
            runtime,
        }
    }

    /// Open an initialized workspace, failing with a hint otherwise.
    pub fn open_existing(root: &Path) -> anyhow::Result<Self> {
        let ws = Self::open(root);
        if !ws.paths.is_initialized() {
            anyhow::bail!(
                "No .quidle/ workspace found at {}. Run `quidle init` first.",
                root.display()
            );
        }
        Ok(ws)
    }
}

/// Format epoch milliseconds as RFC3339 (UTC).
pub fn format_ms(ms: i64) -> String {
    time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|t| {
            t.format(&time::format_description::well_known::Rfc3339)
                .ok()
        })
        .unwrap_or_else(|| ms.to_string())
}
