use crate::error::{InsightsError, Result};
use log::debug;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

/// Caller-owned cache of loaded datasets.
///
/// Entries are keyed by canonical file path and the file's modification time,
/// so a rewritten file is loaded again on the next request. Directories are
/// refused: their modification time does not change when a file inside them
/// is edited in place.
pub struct FileCache<T> {
    entries: HashMap<PathBuf, (SystemTime, Arc<T>)>,
    loads: usize,
}

impl<T> Default for FileCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            loads: 0,
        }
    }
}

impl<T> FileCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `path`, calling `load` when the path is
    /// unknown or its modification time changed.
    ///
    /// # Errors
    /// Returns error if the path cannot be inspected, is a directory, or `load`
    /// fails. A failed load leaves any previous entry untouched.
    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Result<Arc<T>>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let key = fs::canonicalize(path)?;
        let metadata = fs::metadata(&key)?;
        if metadata.is_dir() {
            return Err(InsightsError::Data(format!(
                "Cannot cache directory {}",
                key.display()
            )));
        }
        let modified = metadata.modified()?;

        if let Some((stamp, value)) = self.entries.get(&key) {
            if *stamp == modified {
                debug!("Cache hit for {}", key.display());
                return Ok(Arc::clone(value));
            }
            debug!("Cache stale for {}", key.display());
        }

        let value = Arc::new(load(path)?);
        self.loads += 1;
        self.entries.insert(key, (modified, Arc::clone(&value)));
        Ok(value)
    }

    /// Number of times a loader has run.
    pub fn loads(&self) -> usize {
        self.loads
    }
}
