//! Context-based text-generation engine.
//!
//! Loads a model through a pluggable execution backend, holds mutable
//! generation state in per-session [`Context`]s, and produces one
//! completion per call into a caller-supplied bounded buffer.
//!
//! Model file parsing, the vocabulary, and the transformer forward pass
//! live behind the [`backend`] traits; this crate owns lifecycle,
//! sampling, the decode loop, and the output-buffer boundary. A
//! completion that does not fit the buffer is reported as an error, not
//! truncated.
//!
//! `generate` blocks the calling thread and exposes no cancellation; a
//! context serves one call at a time (enforced by `&mut self`), so
//! parallel generation means one context per thread, optionally sharing
//! a model.

pub mod backend;
pub mod buffer;
pub mod config;
pub mod context;
pub mod dummy;
pub mod engine;
pub mod error;
pub mod model;
pub mod prompt;
pub mod sampler;
pub mod session;
pub mod store;

pub use backend::{DecodeState, ExecutionBackend, ModelExecution, TokenId};
pub use buffer::OutputBuffer;
pub use config::GenerationConfig;
pub use context::Context;
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use model::ModelHandle;
pub use prompt::{PROMPT_PLACEHOLDER, PromptFormat};
pub use sampler::Sampler;
pub use session::{FinishReason, GenerateReport};
pub use store::ModelStore;
