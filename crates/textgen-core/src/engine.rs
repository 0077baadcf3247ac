//! Process-level engine factory.

use std::path::Path;
use std::sync::Arc;

use crate::backend::ExecutionBackend;
use crate::config::GenerationConfig;
use crate::context::Context;
use crate::error::Result;
use crate::store::ModelStore;

/// Entry point of the crate: owns the execution backend and the model
/// cache, and creates generation contexts.
///
/// Construct one per process instead of relying on process-wide library
/// state. Contexts do not borrow from the engine; each keeps its model
/// alive on its own and may outlive the engine.
pub struct Engine {
    store: ModelStore,
}

impl Engine {
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        Self {
            store: ModelStore::new(backend),
        }
    }

    /// Create a context with the default [`GenerationConfig`].
    pub fn create_context(&self, model_path: impl AsRef<Path>) -> Result<Context> {
        self.create_context_with(model_path, GenerationConfig::default())
    }

    /// Create a context with an explicit configuration.
    ///
    /// Fails on an invalid configuration, an unloadable model path, or an
    /// unrecognized model format; nothing is retained on failure. The
    /// configuration is checked first so a bad value never triggers a
    /// model load.
    pub fn create_context_with(
        &self,
        model_path: impl AsRef<Path>,
        config: GenerationConfig,
    ) -> Result<Context> {
        config.validate()?;
        let model = self.store.open(model_path.as_ref())?;
        Context::new(model, config)
    }

    /// Number of live models currently shared by this engine's contexts.
    pub fn loaded_models(&self) -> usize {
        self.store.loaded()
    }
}
