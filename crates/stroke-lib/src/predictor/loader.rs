//! Model resolution and process-lifetime caching

use crate::error::{Error, Result};
use crate::predictor::forest::StrokeForest;
use crate::tracking::{sha256_hex, TrackingStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::info;

/// Where the loader resolves its artifact from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Latest version of a registered name in the tracking store.
    Registry { store_path: PathBuf, name: String },
    /// A plain artifact file, as written by the plain trainer.
    File(PathBuf),
}

/// Resolves the served model once and caches it for the lifetime of the
/// process.
///
/// The cache is write-once: two concurrent first loads may both read the
/// artifact, but whichever lands first wins and every later call observes
/// that fully-loaded model. There is no invalidation; serving a newer
/// registered version requires a restart.
pub struct ModelLoader {
    source: ModelSource,
    cached: OnceLock<Arc<StrokeForest>>,
    loads: AtomicU64,
}

impl ModelLoader {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            cached: OnceLock::new(),
            loads: AtomicU64::new(0),
        }
    }

    /// Cached model, loading it on first use.
    pub fn load(&self) -> Result<Arc<StrokeForest>> {
        if let Some(model) = self.cached.get() {
            return Ok(Arc::clone(model));
        }
        let loaded = Arc::new(self.load_uncached()?);
        Ok(Arc::clone(self.cached.get_or_init(|| loaded)))
    }

    /// Number of artifact reads performed; stays at one once the cache is
    /// warm.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    fn load_uncached(&self) -> Result<StrokeForest> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        match &self.source {
            ModelSource::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    Error::ModelUnavailable(format!("read {}: {e}", path.display()))
                })?;
                let model = StrokeForest::from_bytes(&bytes)?;
                info!(path = %path.display(), "Loaded model from file");
                Ok(model)
            }
            ModelSource::Registry { store_path, name } => {
                let store = TrackingStore::open(store_path)?;
                let version = store.latest_version(name)?.ok_or_else(|| {
                    Error::ModelUnavailable(format!("no versions registered under `{name}`"))
                })?;
                let bytes = std::fs::read(&version.path).map_err(|e| {
                    Error::ModelUnavailable(format!("read {}: {e}", version.path.display()))
                })?;
                let checksum = sha256_hex(&bytes);
                if checksum != version.checksum {
                    return Err(Error::model(format!(
                        "checksum mismatch for {name} v{}: expected {}, got {checksum}",
                        version.version, version.checksum
                    )));
                }
                let model = StrokeForest::from_bytes(&bytes)?;
                info!(model = %name, version = version.version, "Loaded model from registry");
                Ok(model)
            }
        }
    }
}
