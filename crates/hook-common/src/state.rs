//! State documents shared between hook invocations.
//!
//! Every hook is a fresh process, so anything that must outlive one
//! invocation lives in a small JSON document or a marker file under the
//! project's state directory. Reads are total: an absent, unreadable or
//! corrupt document reads as the type's default. Writes replace the whole
//! document through [`write_atomic`], so a concurrent reader sees either the
//! previous or the new document. There is no cross-process locking; two
//! concurrent read-modify-write cycles resolve as last writer wins.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, PersistError};

/// Result of creating a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStatus {
    /// This call created the marker
    Created,
    /// The marker was already there
    AlreadyExists,
}

/// Storage for named documents and marker flags.
pub trait StateBackend: fmt::Debug + Send + Sync {
    /// Raw document contents, `None` when absent or unreadable.
    fn load(&self, key: &str) -> Option<String>;

    /// Replace a document.
    fn save(&self, key: &str, contents: &str) -> Result<()>;

    /// Create a marker as a single test-and-set.
    fn create_marker(&self, key: &str) -> Result<MarkerStatus>;

    /// Check whether a marker exists.
    fn has_marker(&self, key: &str) -> bool;
}

/// Write `contents` to `path` without exposing a partial file.
///
/// The contents go to a temp file in the same directory, which is then
/// renamed over the target. If the rename cannot clobber the target, the
/// target is removed and the rename retried. If that also fails, the
/// contents are written to the target directly.
pub fn write_atomic(path: &Utf8Path, contents: &str) -> Result<()> {
    write_atomic_with(path, contents, |tmp| tmp.persist(path).map(|_| ()))
}

/// [`write_atomic`] with the rename step supplied by the caller.
fn write_atomic_with<P>(path: &Utf8Path, contents: &str, mut persist: P) -> Result<()>
where
    P: FnMut(NamedTempFile) -> Result<(), PersistError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", path))?;
    tmp.flush()
        .with_context(|| format!("Failed to flush temp file for {}", path))?;

    let tmp = match persist(tmp) {
        Ok(()) => return Ok(()),
        Err(err) => err.file,
    };

    if path.exists() {
        let _ = fs::remove_file(path);
    }

    match persist(tmp) {
        Ok(()) => Ok(()),
        Err(err) => {
            // Dropping the temp file removes it.
            drop(err.file);
            fs::write(path, contents)
                .with_context(|| format!("Failed to write state file: {}", path))
        }
    }
}

/// Documents as files in one directory, markers as empty files beside them.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: Utf8PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    pub fn path(&self, key: &str) -> Utf8PathBuf {
        self.dir.join(key)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir))
    }
}

impl StateBackend for FileBackend {
    fn load(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn save(&self, key: &str, contents: &str) -> Result<()> {
        self.ensure_dir()?;
        write_atomic(&self.path(key), contents)
    }

    fn create_marker(&self, key: &str) -> Result<MarkerStatus> {
        self.ensure_dir()?;
        let path = self.path(key);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(MarkerStatus::Created),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(MarkerStatus::AlreadyExists),
            Err(e) => Err(e).with_context(|| format!("Failed to create marker: {}", path)),
        }
    }

    fn has_marker(&self, key: &str) -> bool {
        self.path(key).exists()
    }
}

/// Process-local backend for tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    docs: Mutex<HashMap<String, String>>,
    markers: Mutex<HashSet<String>>,
}

impl StateBackend for MemoryBackend {
    fn load(&self, key: &str) -> Option<String> {
        self.docs.lock().ok()?.get(key).cloned()
    }

    fn save(&self, key: &str, contents: &str) -> Result<()> {
        self.docs
            .lock()
            .map_err(|_| anyhow!("state lock poisoned"))?
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn create_marker(&self, key: &str) -> Result<MarkerStatus> {
        let inserted = self
            .markers
            .lock()
            .map_err(|_| anyhow!("marker lock poisoned"))?
            .insert(key.to_string());
        Ok(if inserted {
            MarkerStatus::Created
        } else {
            MarkerStatus::AlreadyExists
        })
    }

    fn has_marker(&self, key: &str) -> bool {
        self.markers
            .lock()
            .map(|markers| markers.contains(key))
            .unwrap_or(false)
    }
}

/// Typed access to state documents.
///
/// Cheap to clone; clones share the backend.
#[derive(Debug, Clone)]
pub struct StateManager {
    backend: Arc<dyn StateBackend>,
}

impl StateManager {
    /// Wrap a backend.
    pub fn new(backend: impl StateBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// File-backed state in `dir`.
    pub fn in_dir(dir: impl Into<Utf8PathBuf>) -> Self {
        Self::new(FileBackend::new(dir))
    }

    /// State that lives only as long as this manager.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    /// Load a document, `None` if absent or unparseable.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.load(key)?;
        serde_json::from_str(&raw).ok()
    }

    /// Load a document, substituting the default if absent or unparseable.
    pub fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key).unwrap_or_default()
    }

    /// Replace a document.
    pub fn write<T: Serialize>(&self, key: &str, doc: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)
            .with_context(|| format!("Failed to serialize state: {}", key))?;
        self.backend.save(key, &content)
    }

    /// Create a marker; [`MarkerStatus::AlreadyExists`] if another call got there first.
    pub fn create_marker(&self, key: &str) -> Result<MarkerStatus> {
        self.backend.create_marker(key)
    }

    /// Check whether a marker exists.
    pub fn has_marker(&self, key: &str) -> bool {
        self.backend.has_marker(key)
    }
}
