//! Durable registry of tracked characters.
//!
//! The registry is a single JSON document mapping `key -> TrackedEntity`,
//! loaded once at startup and held in memory as the read path. Every mutation
//! rewrites the whole document through a temp-file-then-rename, so a reader
//! can only ever observe the old document or the new one, never a torn write.
//! A failed flush rolls the in-memory map back; memory and disk never diverge.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::TrackedEntity;

/// On-disk keyed registry with an in-memory cache as the read path.
pub struct EntityStore {
    path: PathBuf,
    // BTreeMap keeps iteration order stable across sweeps and restarts.
    entities: BTreeMap<String, TrackedEntity>,
}

impl EntityStore {
    /// Loads the registry from `path`. A missing file is an empty registry;
    /// a present-but-unreadable file is an error, not silent data loss.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let entities = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        log::info!(
            "Loaded {} tracked character(s) from {}",
            entities.len(),
            path.display()
        );

        Ok(Self { path, entities })
    }

    pub fn get(&self, key: &str) -> Option<&TrackedEntity> {
        self.entities.get(key)
    }

    /// Inserts or fully replaces a record and flushes the registry to disk.
    ///
    /// The mutation is only committed once the flush succeeds; on flush
    /// failure the previous in-memory state is restored and the error is
    /// returned, so the caller must treat the entity as unchanged.
    pub fn put(&mut self, entity: TrackedEntity) -> Result<()> {
        let key = entity.key.clone();
        let previous = self.entities.insert(key.clone(), entity);

        if let Err(e) = self.flush() {
            match previous {
                Some(prev) => self.entities.insert(key, prev),
                None => self.entities.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// All tracked characters in key order.
    pub fn all(&self) -> Vec<TrackedEntity> {
        self.entities.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically rewrites the whole document: write a sibling temp file,
    /// then rename it over the target.
    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&self.entities)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;

        log::debug!(
            "Flushed {} tracked character(s) to {}",
            self.entities.len(),
            self.path.display()
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
