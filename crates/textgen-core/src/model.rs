//! Shared, read-only model handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::backend::{DecodeState, ModelExecution, TokenId};
use crate::error::Result;

/// A loaded model shared by every context created from the same file.
///
/// Handed out as `Arc<ModelHandle>`; the underlying weights are released
/// when the last referencing context (and the store's cache entry) drops.
pub struct ModelHandle {
    exec: Arc<dyn ModelExecution>,
    path: PathBuf,
}

impl ModelHandle {
    pub(crate) fn new(exec: Arc<dyn ModelExecution>, path: PathBuf) -> Self {
        Self { exec, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn n_vocab(&self) -> usize {
        self.exec.n_vocab()
    }

    pub fn token_eos(&self) -> TokenId {
        self.exec.token_eos()
    }

    /// Human-readable model description, if the backend provides one.
    pub fn describe(&self) -> String {
        self.exec.describe()
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<TokenId>> {
        self.exec.tokenize(text)
    }

    pub fn token_to_piece(&self, token: TokenId) -> String {
        self.exec.token_to_piece(token)
    }

    pub(crate) fn new_state(&self, ctx_size: usize) -> Result<Box<dyn DecodeState>> {
        self.exec.new_state(ctx_size)
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Releasing model");
    }
}
