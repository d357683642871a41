use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::io::lock::{FileLock, LockError};
use crate::model::app_data::AppData;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid board document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("version conflict: expected {expected}, store has {found}")]
    Conflict { expected: u64, found: u64 },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Key-value persistence for whole board documents.
///
/// Every save carries the `_version` it was based on; the store rejects it
/// with [`StoreError::Conflict`] when someone else saved in between, and
/// otherwise returns the new version.
pub trait Store: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<AppData>, StoreError>;
    fn save(&self, key: &str, data: &AppData) -> Result<u64, StoreError>;
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// One pretty-printed JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { dir: dir.into() }
    }

    /// Store rooted at the directory of `file`, keyed by its file stem.
    /// `./board.json` becomes (`.`, `board`).
    pub fn for_file(file: &Path) -> (Self, String) {
        let dir = match file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let key = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "treeboard".to_string());
        (JsonFileStore::new(dir), key)
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn read(&self, key: &str) -> Result<Option<AppData>, StoreError> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl Store for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<AppData>, StoreError> {
        self.read(key)
    }

    fn save(&self, key: &str, data: &AppData) -> Result<u64, StoreError> {
        fs::create_dir_all(&self.dir)?;
        let _lock = FileLock::acquire_default(&self.dir, key)?;

        let found = self.read(key)?.map(|d| d.version).unwrap_or(0);
        if found != data.version {
            warn!(key, expected = data.version, found, "save rejected: version conflict");
            return Err(StoreError::Conflict {
                expected: data.version,
                found,
            });
        }

        let next = AppData {
            version: found + 1,
            ..data.clone()
        };
        let mut json = serde_json::to_string_pretty(&next)?;
        json.push('\n');
        atomic_write(&self.path_for(key), json.as_bytes())?;
        debug!(key, version = next.version, "document written");
        Ok(next.version)
    }
}

/// Write via temp file + rename so readers never see a partial document.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store with the same version semantics as the file store
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, AppData>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<AppData>, StoreError> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| io::Error::other("memory store poisoned"))?;
        Ok(docs.get(key).cloned())
    }

    fn save(&self, key: &str, data: &AppData) -> Result<u64, StoreError> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| io::Error::other("memory store poisoned"))?;
        let found = docs.get(key).map(|d| d.version).unwrap_or(0);
        if found != data.version {
            return Err(StoreError::Conflict {
                expected: data.version,
                found,
            });
        }
        let version = found + 1;
        docs.insert(
            key.to_string(),
            AppData {
                version,
                ..data.clone()
            },
        );
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }
}
