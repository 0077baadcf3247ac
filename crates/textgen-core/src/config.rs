//! Generation configuration.

use crate::error::{EngineError, Result};

/// Per-context generation settings.
///
/// `max_tokens`, `threads`, and `batch` may be changed after context
/// creation through the dedicated setters on
/// [`Context`](crate::context::Context); the remaining fields are fixed
/// for the lifetime of the context.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerationConfig {
    /// Completion budget per generation call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Tokens fed per execution step while priming the prompt.
    #[serde(default = "default_batch")]
    pub batch: u32,
    /// Context window size in positions.
    #[serde(default = "default_ctx_size")]
    pub ctx_size: u32,
    /// Parallelism hint for the model-execution step.
    #[serde(default = "default_threads")]
    pub threads: u32,
    /// Top-k candidate cut. `<= 0` disables the filter.
    #[serde(default = "default_top_k")]
    pub top_k: i32,
    /// Nucleus cut. `>= 1.0` disables the filter.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Logit scaling. `<= 0.0` selects greedy decoding.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Random-stream seed for the sampler.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_max_tokens() -> u32 {
    256
}
fn default_batch() -> u32 {
    64
}
fn default_ctx_size() -> u32 {
    2048
}
fn default_threads() -> u32 {
    8
}
fn default_top_k() -> i32 {
    50
}
fn default_top_p() -> f32 {
    0.9
}
fn default_temperature() -> f32 {
    0.5
}
fn default_seed() -> u64 {
    42
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            batch: default_batch(),
            ctx_size: default_ctx_size(),
            threads: default_threads(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            temperature: default_temperature(),
            seed: default_seed(),
        }
    }
}

impl GenerationConfig {
    /// Reject configurations the engine cannot honor.
    ///
    /// Invalid values fail context creation instead of being clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(EngineError::InvalidConfig("max_tokens must be positive".into()));
        }
        if self.batch == 0 {
            return Err(EngineError::InvalidConfig("batch must be positive".into()));
        }
        if self.ctx_size == 0 {
            return Err(EngineError::InvalidConfig("ctx_size must be positive".into()));
        }
        if self.threads == 0 {
            return Err(EngineError::InvalidConfig("threads must be positive".into()));
        }
        if !self.top_p.is_finite() {
            return Err(EngineError::InvalidConfig("top_p must be finite".into()));
        }
        if !self.temperature.is_finite() {
            return Err(EngineError::InvalidConfig("temperature must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.max_tokens, 256);
        assert_eq!(cfg.batch, 64);
        assert_eq!(cfg.ctx_size, 2048);
        assert_eq!(cfg.threads, 8);
        assert_eq!(cfg.top_k, 50);
        assert_eq!(cfg.top_p, 0.9);
        assert_eq!(cfg.temperature, 0.5);
        assert_eq!(cfg.seed, 42);
        cfg.validate().unwrap();
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let cfg: GenerationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, GenerationConfig::default());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let cfg: GenerationConfig =
            serde_json::from_str(r#"{"max_tokens": 16, "temperature": 0.0}"#).unwrap();
        assert_eq!(cfg.max_tokens, 16);
        assert_eq!(cfg.temperature, 0.0);
        assert_eq!(cfg.batch, 64);
        assert_eq!(cfg.seed, 42);
    }

    #[test]
    fn zero_fields_are_rejected() {
        for field in ["max_tokens", "batch", "ctx_size", "threads"] {
            let mut cfg = GenerationConfig::default();
            match field {
                "max_tokens" => cfg.max_tokens = 0,
                "batch" => cfg.batch = 0,
                "ctx_size" => cfg.ctx_size = 0,
                _ => cfg.threads = 0,
            }
            assert!(cfg.validate().is_err(), "{field} = 0 must fail validation");
        }
    }

    #[test]
    fn non_finite_sampling_fields_are_rejected() {
        let mut cfg = GenerationConfig::default();
        cfg.top_p = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = GenerationConfig::default();
        cfg.temperature = f32::INFINITY;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn greedy_and_disabled_filters_are_valid() {
        let cfg = GenerationConfig {
            top_k: 0,
            top_p: 1.0,
            temperature: 0.0,
            ..GenerationConfig::default()
        };
        cfg.validate().unwrap();
    }
}
