use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to load model from '{path}': {reason}")]
    ModelLoadFailed { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to create context: {0}")]
    ContextCreationFailed(String),

    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),

    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("Sampler error: {0}")]
    SamplerError(String),

    #[error("Prompt format must contain the '{{prompt}}' placeholder")]
    InvalidPromptFormat,

    #[error("Output buffer of {capacity} bytes is too small for the completion")]
    BufferOverflow { capacity: usize },

    #[error("Prompt of {tokens} tokens exceeds the context size of {ctx_size}")]
    ContextOverflow { tokens: usize, ctx_size: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
