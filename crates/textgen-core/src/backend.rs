//! Seam between the engine and its model-execution collaborator.
//!
//! Model file parsing, the vocabulary, and the forward pass live behind
//! these traits. The engine owns everything else: lifecycle, sampling,
//! the decode loop, and the output-buffer boundary.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Token identifier within a model's vocabulary.
pub type TokenId = i32;

/// Loads model files and hands out shared execution handles.
pub trait ExecutionBackend: Send + Sync {
    /// Short backend identifier used in log output.
    fn name(&self) -> &str;

    /// Load the model at `path`.
    ///
    /// Fails when the file cannot be read or its format is not
    /// recognized; nothing may be retained on failure.
    fn load_model(&self, path: &Path) -> Result<Arc<dyn ModelExecution>>;
}

/// A loaded model: weights, vocabulary, and architecture metadata.
///
/// Read-only after load and shared by every context created from the
/// same file.
pub trait ModelExecution: Send + Sync {
    /// Vocabulary size (logit distributions have this length).
    fn n_vocab(&self) -> usize;

    /// End-of-sequence token.
    fn token_eos(&self) -> TokenId;

    /// Tokenize `text` with the model's vocabulary.
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Convert a single token id to its text piece.
    ///
    /// Unknown or control tokens map to the empty string.
    fn token_to_piece(&self, token: TokenId) -> String;

    /// Allocate per-context decode state sized to `ctx_size` positions.
    fn new_state(&self, ctx_size: usize) -> Result<Box<dyn DecodeState>>;

    /// Human-readable model description.
    fn describe(&self) -> String {
        String::new()
    }
}

/// Mutable per-context attention state plus the forward pass.
///
/// `feed` must produce the same logits for the same token sequence
/// regardless of `threads`; an implementation whose floating-point
/// reduction order varies with the thread count breaks the engine's
/// determinism contract and must document that deviation.
pub trait DecodeState: Send {
    /// Feed a batch of tokens and advance the held positions.
    ///
    /// `threads` is a parallelism hint for the execution step only.
    fn feed(&mut self, tokens: &[TokenId], threads: usize) -> Result<()>;

    /// Logits over the vocabulary for the last fed position.
    fn logits(&self) -> &[f32];

    /// Number of positions currently held.
    fn n_past(&self) -> usize;

    /// Drop all held positions.
    fn clear(&mut self);
}
