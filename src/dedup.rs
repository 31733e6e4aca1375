use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, Result};

/// Keys (`source:identifier`) of listings that have already been alerted.
///
/// The set only grows. When backed by a file it is loaded once and flushed on
/// request; losing the file means some listings alert again after a restart.
#[derive(Debug, Default)]
pub struct SeenStore {
    keys: HashSet<String>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl SeenStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing or unreadable file starts an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let keys = match Self::read_keys(&path) {
            Ok(keys) => {
                tracing::info!(path = %path.display(), count = keys.len(), "Loaded seen listings");
                keys
            }
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No seen listings file, starting empty");
                HashSet::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable seen listings file");
                HashSet::new()
            }
        };

        Self {
            keys,
            path: Some(path),
            dirty: false,
        }
    }

    fn read_keys(path: &Path) -> Result<HashSet<String>> {
        let content = std::fs::read_to_string(path)?;
        let keys: Vec<String> = serde_json::from_str(&content)?;
        Ok(keys.into_iter().collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Returns `true` when the key was not seen before.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        let inserted = self.keys.insert(key.into());
        self.dirty |= inserted;
        inserted
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the set if anything was inserted since the last flush.
    /// Returns whether a write happened.
    pub fn flush(&mut self) -> Result<bool> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };
        if !self.dirty {
            return Ok(false);
        }

        let mut keys: Vec<&String> = self.keys.iter().collect();
        keys.sort();
        let content = serde_json::to_string(&keys)?;

        Self::write_atomically(path, &content)
            .map_err(|e| AppError::Persistence(format!("{}: {}", path.display(), e)))?;

        self.dirty = false;
        Ok(true)
    }

    fn write_atomically(path: &Path, content: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)
    }
}
