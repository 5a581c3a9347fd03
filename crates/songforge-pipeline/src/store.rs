//! Content-addressed object storage for rendered audio.
//!
//! Every artifact (stem PCM, master WAV) is stored under the BLAKE3 hex
//! digest of its bytes, so identical renders share a single object and
//! keys never collide with stale content.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use songforge_core::error::SongError;
use songforge_core::hash::blake3_hex;

/// Content-addressed blob store.
///
/// `put` returns the BLAKE3 hex key of the stored bytes; `get` returns
/// `None` for keys that were never stored.
pub trait ObjectStore: Send + Sync {
    fn put(&self, bytes: &[u8]) -> Result<String, SongError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SongError>;
}

/// In-memory store, used by tests and by services running without a
/// data directory.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, bytes: &[u8]) -> Result<String, SongError> {
        let key = blake3_hex(bytes);
        let mut objects = self
            .objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        objects.entry(key.clone()).or_insert_with(|| bytes.to_vec());
        Ok(key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SongError> {
        let objects = self
            .objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(objects.get(key).cloned())
    }
}

/// Filesystem store: one file per object under `root`, fanned out by the
/// first two hex characters of the key to keep directories small.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SongError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| storage_error("create store root", &root, e))?;
        Ok(Self { root })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        let fanout = &key[..key.len().min(2)];
        self.root.join(fanout).join(key)
    }
}

impl ObjectStore for FsStore {
    fn put(&self, bytes: &[u8]) -> Result<String, SongError> {
        let key = blake3_hex(bytes);
        let path = self.object_path(&key);
        if path.exists() {
            return Ok(key);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error("create fanout dir", parent, e))?;
        }
        // Write-then-rename so readers never observe a partial object.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| storage_error("write object", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| storage_error("commit object", &path, e))?;
        Ok(key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SongError> {
        let path = self.object_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read object", &path, e)),
        }
    }
}

pub(crate) fn storage_error(action: &str, path: &Path, err: std::io::Error) -> SongError {
    SongError::synthesis(format!("storage: {} {}: {}", action, path.display(), err))
}
