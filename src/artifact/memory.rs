// src/artifact/memory.rs

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::ArtifactStore;

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, String>,
    failing: HashSet<String>,
    writes: Vec<String>,
}

/// In-memory [`ArtifactStore`].
///
/// Clones share state, so a test can keep a handle while the executor owns
/// another. Names registered with [`MemoryArtifactStore::fail_on`] make
/// `write` return an error.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    root: PathBuf,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("."),
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every write of `name` fail with a permission error.
    pub fn fail_on(&self, name: &str) {
        self.lock().failing.insert(name.to_string());
    }

    /// Contents stored under `name`, if any.
    pub fn read(&self, name: &str) -> Option<String> {
        self.lock().files.get(&self.root.join(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().files.contains_key(&self.root.join(name))
    }

    /// Names of successful writes, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn location(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.location(name);
        let mut state = self.lock();
        if state.failing.contains(name) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("write to {:?} refused", path),
            ));
        }
        state.files.insert(path.clone(), contents.to_string());
        state.writes.push(name.to_string());
        Ok(path)
    }
}
