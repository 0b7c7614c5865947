//! Flat key-value storage facility.
//!
//! Mirrors the host storage contract: get a set of keys, set a batch of keys,
//! remove keys. Every mutation is a read-modify-write under one exclusive
//! section, so independent writers never clobber unrelated keys.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub type KvMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage file {path} is corrupt: {detail}")]
    Corrupt { path: PathBuf, detail: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Mutation callback. Returns whether the map changed and must be written.
pub type UpdateFn<'a> = dyn FnMut(&mut KvMap) -> Result<bool, StoreError> + 'a;

pub trait KvStore: Send + Sync {
    /// Read the whole store.
    fn load(&self) -> Result<KvMap, StoreError>;

    /// Read-modify-write under the store's exclusive section.
    fn update(&self, f: &mut UpdateFn<'_>) -> Result<(), StoreError>;

    /// Values for `keys`; absent keys are simply missing from the result.
    fn get(&self, keys: &[&str]) -> Result<KvMap, StoreError> {
        let all = self.load()?;
        Ok(keys
            .iter()
            .filter_map(|k| all.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set(&self, items: KvMap) -> Result<(), StoreError> {
        let mut items = Some(items);
        self.update(&mut |map| {
            if let Some(items) = items.take() {
                map.extend(items);
            }
            Ok(true)
        })
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(&mut |map| {
            let mut changed = false;
            for key in keys {
                changed |= map.remove(*key).is_some();
            }
            Ok(changed)
        })
    }
}

// ── JSON file store ──

/// Store backed by one JSON object on disk, guarded by an `fs2` lock file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_path: lock_path.into(),
        }
    }

    pub fn open(paths: &crate::QuidlePaths) -> Self {
        Self::new(paths.storage_json.clone(), paths.lock_file.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<crate::LockGuard, StoreError> {
        crate::lock_file(&self.lock_path).map_err(|source| StoreError::Io {
            path: self.lock_path.clone(),
            source,
        })
    }

    fn read_map(&self) -> Result<KvMap, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(KvMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(KvMap::new());
        }
        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                detail: "top-level value is not a JSON object".into(),
            }),
            Err(e) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                detail: e.to_string(),
            }),
        }
    }

    fn write_map(&self, map: &KvMap) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(map).map_err(|source| StoreError::Encode {
            key: "*".to_string(),
            source,
        })?;
        crate::write_atomic(&self.path, json.as_bytes()).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e.into(),
        })
    }
}

impl KvStore for JsonFileStore {
    fn load(&self) -> Result<KvMap, StoreError> {
        let _guard = self.lock()?;
        self.read_map()
    }

    fn update(&self, f: &mut UpdateFn<'_>) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut map = self.read_map()?;
        if f(&mut map)? {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// ── In-memory store ──

/// Process-local store. `set_failing(true)` makes every call fail, for
/// exercising error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<KvMap>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(map: KvMap) -> Self {
        Self {
            map: Mutex::new(map),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store set to fail".into()))
        } else {
            Ok(())
        }
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, KvMap>, StoreError> {
        self.map
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))
    }
}

impl KvStore for MemoryStore {
    fn load(&self) -> Result<KvMap, StoreError> {
        self.check()?;
        Ok(self.guard()?.clone())
    }

    fn update(&self, f: &mut UpdateFn<'_>) -> Result<(), StoreError> {
        self.check()?;
        let mut map = self.guard()?;
        let mut scratch = map.clone();
        if f(&mut scratch)? {
            *map = scratch;
        }
        Ok(())
    }
}
