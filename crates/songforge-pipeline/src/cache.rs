//! Render cache keyed by the canonical render key.
//!
//! Vocal and instrumental renders are cached independently so a failed
//! stage never throws away the stems the other stage already produced.
//! Each entry is a small JSON manifest pointing at content-addressed
//! objects in the [`ObjectStore`].

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use songforge_core::error::SongError;
use songforge_core::stem::{Stem, StemKind};
use tracing::warn;

use crate::store::{storage_error, ObjectStore};

/// Cache component under a single render key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderComponent {
    Vocal,
    Instrumental,
}

impl RenderComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderComponent::Vocal => "vocal",
            RenderComponent::Instrumental => "instrumental",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StemEntry {
    kind: StemKind,
    sample_rate: u32,
    object: String,
}

/// On-disk manifest for one cached render component.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StemManifest {
    render_key: String,
    component: RenderComponent,
    created_at: DateTime<Utc>,
    stems: Vec<StemEntry>,
}

/// Cache of rendered stems, indexed by `(render_key, component)`.
pub struct RenderCache {
    store: Arc<dyn ObjectStore>,
    manifest_dir: Option<PathBuf>,
    index: RwLock<HashMap<(String, RenderComponent), StemManifest>>,
}

impl RenderCache {
    /// In-memory cache with no manifest persistence.
    pub fn ephemeral(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            manifest_dir: None,
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Cache persisting manifests under `dir`, reloading any manifests a
    /// previous process left behind.
    pub fn persistent(store: Arc<dyn ObjectStore>, dir: impl Into<PathBuf>) -> Result<Self, SongError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error("create cache dir", &dir, e))?;
        let mut index = HashMap::new();
        let entries = fs::read_dir(&dir).map_err(|e| storage_error("scan cache dir", &dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| storage_error("scan cache dir", &dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(&path).map_err(|e| e.to_string()).and_then(|bytes| {
                serde_json::from_slice::<StemManifest>(&bytes).map_err(|e| e.to_string())
            }) {
                Ok(manifest) => {
                    index.insert((manifest.render_key.clone(), manifest.component), manifest);
                }
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "skipping unreadable cache manifest");
                }
            }
        }
        Ok(Self {
            store,
            manifest_dir: Some(dir),
            index: RwLock::new(index),
        })
    }

    /// Fetch cached stems for a render component. A manifest whose
    /// objects have gone missing counts as a miss.
    pub fn lookup(
        &self,
        render_key: &str,
        component: RenderComponent,
    ) -> Result<Option<Vec<Stem>>, SongError> {
        let manifest = {
            let index = self
                .index
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match index.get(&(render_key.to_string(), component)) {
                Some(manifest) => manifest.clone(),
                None => return Ok(None),
            }
        };
        let mut stems = Vec::with_capacity(manifest.stems.len());
        for entry in &manifest.stems {
            let Some(bytes) = self.store.get(&entry.object)? else {
                warn!(render_key, object = %entry.object, "cache manifest points at missing object");
                return Ok(None);
            };
            stems.push(Stem {
                kind: entry.kind,
                sample_rate: entry.sample_rate,
                samples: decode_samples(&bytes),
            });
        }
        Ok(Some(stems))
    }

    /// Store a freshly rendered component.
    pub fn insert(
        &self,
        render_key: &str,
        component: RenderComponent,
        stems: &[Stem],
    ) -> Result<(), SongError> {
        let mut entries = Vec::with_capacity(stems.len());
        for stem in stems {
            let object = self.store.put(&encode_samples(&stem.samples))?;
            entries.push(StemEntry {
                kind: stem.kind,
                sample_rate: stem.sample_rate,
                object,
            });
        }
        let manifest = StemManifest {
            render_key: render_key.to_string(),
            component,
            created_at: Utc::now(),
            stems: entries,
        };
        if let Some(dir) = &self.manifest_dir {
            let path = dir.join(format!("{}-{}.json", render_key, component.as_str()));
            let json = serde_json::to_vec_pretty(&manifest)
                .map_err(|e| SongError::synthesis(format!("encode cache manifest: {}", e)))?;
            fs::write(&path, json).map_err(|e| storage_error("write cache manifest", &path, e))?;
        }
        let mut index = self
            .index
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        index.insert((render_key.to_string(), component), manifest);
        Ok(())
    }
}

fn encode_samples(samples: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 8);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

fn decode_samples(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stem(kind: StemKind, samples: Vec<f64>) -> Stem {
        Stem {
            kind,
            sample_rate: 44_100,
            samples,
        }
    }

    #[test]
    fn miss_then_hit() {
        let store: Arc<dyn ObjectStore> = Arc::new(crate::store::MemoryStore::new());
        let cache = RenderCache::ephemeral(store);
        assert!(cache.lookup("abc", RenderComponent::Vocal).unwrap().is_none());

        let stems = vec![stem(StemKind::Vocal, vec![0.0, 0.5, -0.5])];
        cache.insert("abc", RenderComponent::Vocal, &stems).unwrap();
        let hit = cache.lookup("abc", RenderComponent::Vocal).unwrap().unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].kind, StemKind::Vocal);
        assert_eq!(hit[0].samples, vec![0.0, 0.5, -0.5]);
    }

    #[test]
    fn components_are_independent() {
        let store: Arc<dyn ObjectStore> = Arc::new(crate::store::MemoryStore::new());
        let cache = RenderCache::ephemeral(store);
        let vocal = vec![stem(StemKind::Vocal, vec![0.1])];
        cache.insert("k", RenderComponent::Vocal, &vocal).unwrap();
        assert!(cache.lookup("k", RenderComponent::Instrumental).unwrap().is_none());
        assert!(cache.lookup("k", RenderComponent::Vocal).unwrap().is_some());
    }

    #[test]
    fn persistent_cache_reloads_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> =
            Arc::new(crate::store::FsStore::new(dir.path().join("objects")).unwrap());
        let stems = vec![
            stem(StemKind::Drums, vec![0.2, 0.3]),
            stem(StemKind::Bass, vec![-0.1]),
        ];
        {
            let cache =
                RenderCache::persistent(Arc::clone(&store), dir.path().join("cache")).unwrap();
            cache
                .insert("key1", RenderComponent::Instrumental, &stems)
                .unwrap();
        }
        let cache = RenderCache::persistent(store, dir.path().join("cache")).unwrap();
        let hit = cache
            .lookup("key1", RenderComponent::Instrumental)
            .unwrap()
            .unwrap();
        assert_eq!(hit.len(), 2);
        assert_eq!(hit[0].kind, StemKind::Drums);
        assert_eq!(hit[1].samples, vec![-0.1]);
    }
}
