//! Path-keyed model cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, info};

use crate::backend::ExecutionBackend;
use crate::error::{EngineError, Result};
use crate::model::ModelHandle;

/// Loads models through the execution backend and shares live handles
/// across contexts, keyed by canonical path.
///
/// The cache holds weak references only: a model stays loaded exactly as
/// long as some context (or caller) still references it.
pub struct ModelStore {
    backend: Arc<dyn ExecutionBackend>,
    cache: Mutex<HashMap<PathBuf, Weak<ModelHandle>>>,
}

impl ModelStore {
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        Self {
            backend,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load the model at `path`, or attach to the live handle if that
    /// file is already loaded.
    ///
    /// Loading happens under the cache lock, so one model loads at a time.
    pub fn open(&self, path: &Path) -> Result<Arc<ModelHandle>> {
        let key = path
            .canonicalize()
            .map_err(|e| EngineError::ModelLoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut cache = self.cache.lock().unwrap();
        if let Some(handle) = cache.get(&key).and_then(Weak::upgrade) {
            debug!(path = %key.display(), "Attached to cached model");
            return Ok(handle);
        }

        let exec = self.backend.load_model(&key)?;
        let handle = Arc::new(ModelHandle::new(exec, key.clone()));
        cache.retain(|_, weak| weak.strong_count() > 0);
        cache.insert(key.clone(), Arc::downgrade(&handle));
        info!(path = %key.display(), backend = self.backend.name(), "Model loaded");
        Ok(handle)
    }

    /// Number of live models in the cache.
    pub fn loaded(&self) -> usize {
        self.cache
            .lock()
            .unwrap()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{self, DummyBackend};

    fn store_with_model(script: &str) -> (ModelStore, tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.tgdummy");
        dummy::write_model(&path, script).unwrap();
        (ModelStore::new(Arc::new(DummyBackend)), dir, path)
    }

    #[test]
    fn second_open_attaches_to_the_cached_model() {
        let (store, _dir, path) = store_with_model("abc");
        let a = store.open(&path).unwrap();
        let b = store.open(&path).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.loaded(), 1);
    }

    #[test]
    fn model_is_released_when_unreferenced() {
        let (store, _dir, path) = store_with_model("abc");
        let handle = store.open(&path).unwrap();
        assert_eq!(store.loaded(), 1);
        drop(handle);
        assert_eq!(store.loaded(), 0);
        // A later open reloads rather than resurrecting the dead entry.
        let again = store.open(&path).unwrap();
        assert_eq!(again.n_vocab(), 128);
    }

    #[test]
    fn missing_path_fails_without_a_cache_entry() {
        let (store, dir, _path) = store_with_model("abc");
        let missing = dir.path().join("nope.tgdummy");
        assert!(matches!(
            store.open(&missing),
            Err(EngineError::ModelLoadFailed { .. })
        ));
        assert_eq!(store.loaded(), 0);
    }
}
