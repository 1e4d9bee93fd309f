// src/artifact/mod.rs

//! Artifact persistence.
//!
//! - [`ArtifactStore`] is what the executor writes task results through.
//! - [`DirArtifactStore`] writes files under an output directory.
//! - [`memory`] keeps artifacts in memory for tests.
//! - [`fences`] strips a Markdown code fence wrapping generated text.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

pub mod fences;
pub mod memory;

pub use fences::strip_code_fences;
pub use memory::MemoryArtifactStore;

/// Abstract artifact store.
pub trait ArtifactStore: Send + Sync + Debug {
    /// Where an artifact with this name is (or would be) stored.
    fn location(&self, name: &str) -> PathBuf;

    /// Persist `contents` under `name`, replacing any previous artifact.
    /// Returns the location written.
    fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf>;
}

/// Canonical form of an artifact name, used to tell whether two names refer
/// to the same stored artifact.
///
/// `.` components and repeated separators are dropped, so `./a.md` and
/// `docs//a.md` map to the same key as `a.md` and `docs/a.md`. Returns
/// `None` for names that are empty, absolute or contain `..`.
pub fn artifact_key(name: &str) -> Option<PathBuf> {
    let mut key = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => key.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if key.as_os_str().is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Store that writes each artifact to `<root>/<name>`.
#[derive(Debug, Clone)]
pub struct DirArtifactStore {
    root: PathBuf,
}

impl DirArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactStore for DirArtifactStore {
    fn location(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.location(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }
}
