//! Key-value persistence and the task collection stored on top of it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Result, StepwiseError};
use crate::paths;
use crate::types::TaskRecord;

// ---------------------------------------------------------------------------
// KeyValueStore
// ---------------------------------------------------------------------------

/// Opaque string-keyed storage. A missing key reads as `None`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One file per key under a directory, written atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store used for a project root: `<root>/.stepwise/store`.
    pub fn for_root(root: &Path) -> Self {
        Self::new(paths::store_dir(root))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StepwiseError::ValidationRejected(format!(
                "invalid store key '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        crate::io::read_optional(&self.path(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        crate::io::atomic_write(&self.path(key)?, value.as_bytes())
    }
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StepwiseError::PersistenceFailure("store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StepwiseError::PersistenceFailure("store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TaskRepository
// ---------------------------------------------------------------------------

/// The task collection: a JSON array of [`TaskRecord`] under [`paths::TASKS_KEY`].
#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn KeyValueStore>,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn for_root(root: &Path) -> Self {
        Self::new(Arc::new(FileStore::for_root(root)))
    }

    /// All records in save order (first saved first).
    pub fn load_all(&self) -> Result<Vec<TaskRecord>> {
        match self.store.get(paths::TASKS_KEY)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(&data)?),
            _ => Ok(Vec::new()),
        }
    }

    pub fn find_by_title(&self, title: &str) -> Result<Option<TaskRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|r| r.task_title == title))
    }

    /// Insert `record`, replacing in place any record with the same title.
    pub fn upsert(&self, record: &TaskRecord) -> Result<()> {
        let mut records = self.load_all()?;
        match records
            .iter_mut()
            .find(|r| r.task_title == record.task_title)
        {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        let data = serde_json::to_string(&records)?;
        self.store.set(paths::TASKS_KEY, &data)
    }
}

impl std::fmt::Debug for TaskRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRepository").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
