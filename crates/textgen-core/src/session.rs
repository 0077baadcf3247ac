//! Per-context decode loop.

use std::time::Duration;

use tracing::debug;

use crate::backend::{DecodeState, TokenId};
use crate::buffer::OutputBuffer;
use crate::config::GenerationConfig;
use crate::error::{EngineError, Result};
use crate::model::ModelHandle;
use crate::sampler::Sampler;

/// Why a generation run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural stop (EOS token).
    Stop,
    /// Reached `max_tokens` or the context window.
    Length,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::Length => write!(f, "length"),
        }
    }
}

/// Outcome of a successful generation call.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub finish_reason: FinishReason,
    /// Tokens in the (possibly template-wrapped) prompt.
    pub prompt_tokens: u32,
    /// Tokens sampled, including a terminating EOS.
    pub completion_tokens: u32,
    /// Completion bytes written to the caller's buffer.
    pub bytes_written: usize,
    pub elapsed: Duration,
}

impl GenerateReport {
    /// Generation speed (tokens/s).
    pub fn tokens_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completion_tokens as f64 / secs
        } else {
            0.0
        }
    }
}

/// Decode-loop state machine: idle between calls, running inside `run`,
/// and back to idle on every exit path so the context stays reusable.
pub(crate) struct Session {
    state: Box<dyn DecodeState>,
    ctx_size: usize,
}

impl Session {
    pub(crate) fn new(state: Box<dyn DecodeState>, ctx_size: usize) -> Self {
        Self { state, ctx_size }
    }

    /// Prime the prompt and decode until a stop condition.
    ///
    /// Completion text is streamed into `out` piece by piece; an overflow
    /// aborts the run with [`EngineError::BufferOverflow`] rather than
    /// returning partial text.
    pub(crate) fn run(
        &mut self,
        model: &ModelHandle,
        sampler: &mut Sampler,
        config: &GenerationConfig,
        prompt: &[TokenId],
        out: &mut OutputBuffer<'_>,
    ) -> Result<(FinishReason, u32)> {
        if prompt.is_empty() {
            return Err(EngineError::TokenizationFailed(
                "prompt produced no tokens".into(),
            ));
        }
        if prompt.len() > self.ctx_size {
            return Err(EngineError::ContextOverflow {
                tokens: prompt.len(),
                ctx_size: self.ctx_size,
            });
        }

        // Re-prime the attention state from scratch for this call.
        self.state.clear();
        let threads = config.threads as usize;
        for chunk in prompt.chunks(config.batch as usize) {
            self.state.feed(chunk, threads)?;
        }

        let eos = model.token_eos();
        let mut completion_tokens = 0u32;

        let reason = loop {
            if completion_tokens >= config.max_tokens {
                break FinishReason::Length;
            }

            let token = sampler.sample(self.state.logits())?;
            completion_tokens += 1;

            if token == eos {
                break FinishReason::Stop;
            }

            let piece = model.token_to_piece(token);
            out.push_str(&piece)?;

            // Context-window guard.
            if self.state.n_past() >= self.ctx_size {
                break FinishReason::Length;
            }

            self.state.feed(&[token], threads)?;
        };

        debug!(%reason, completion_tokens, "Decode loop finished");
        Ok((reason, completion_tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy;
    use std::path::PathBuf;

    fn harness(script: &str, config: &GenerationConfig) -> (ModelHandle, Session, Sampler) {
        let exec = dummy::model_from_script(script);
        let model = ModelHandle::new(exec, PathBuf::from("test.tgdummy"));
        let state = model.new_state(config.ctx_size as usize).unwrap();
        let session = Session::new(state, config.ctx_size as usize);
        let sampler = Sampler::new(config);
        (model, session, sampler)
    }

    fn greedy_config() -> GenerationConfig {
        GenerationConfig {
            temperature: 0.0,
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn completes_the_script_and_stops_on_eos() {
        let config = greedy_config();
        let (model, mut session, mut sampler) = harness("Hello world.", &config);
        let prompt = model.tokenize("Hello").unwrap();

        let mut raw = [0u8; 64];
        let mut out = OutputBuffer::new(&mut raw);
        let (reason, tokens) = session
            .run(&model, &mut sampler, &config, &prompt, &mut out)
            .unwrap();

        assert_eq!(reason, FinishReason::Stop);
        assert_eq!(out.as_str(), " world.");
        // Seven text tokens plus the EOS.
        assert_eq!(tokens, 8);
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let config = greedy_config();
        let (model, mut session, mut sampler) = harness("abc", &config);
        let mut raw = [0u8; 16];
        let mut out = OutputBuffer::new(&mut raw);
        assert!(matches!(
            session.run(&model, &mut sampler, &config, &[], &mut out),
            Err(EngineError::TokenizationFailed(_))
        ));
    }

    #[test]
    fn oversized_prompt_is_rejected() {
        let config = GenerationConfig {
            ctx_size: 4,
            ..greedy_config()
        };
        let (model, mut session, mut sampler) = harness("abcdefgh", &config);
        let prompt = model.tokenize("abcdefgh").unwrap();
        let mut raw = [0u8; 16];
        let mut out = OutputBuffer::new(&mut raw);
        assert!(matches!(
            session.run(&model, &mut sampler, &config, &prompt, &mut out),
            Err(EngineError::ContextOverflow { tokens: 8, ctx_size: 4 })
        ));
    }

    #[test]
    fn context_window_bounds_the_run() {
        let config = GenerationConfig {
            ctx_size: 8,
            ..greedy_config()
        };
        let (model, mut session, mut sampler) =
            harness("0123456789abcdefghij", &config);
        let prompt = model.tokenize("01234").unwrap();
        let mut raw = [0u8; 64];
        let mut out = OutputBuffer::new(&mut raw);
        let (reason, _) = session
            .run(&model, &mut sampler, &config, &prompt, &mut out)
            .unwrap();
        assert_eq!(reason, FinishReason::Length);
        // Five prompt positions leave room for three decode steps plus
        // the final sample taken at the window edge.
        assert_eq!(out.as_str(), "5678");
    }

    #[test]
    fn max_tokens_bounds_the_run() {
        let mut config = greedy_config();
        config.max_tokens = 4;
        let (model, mut session, mut sampler) =
            harness("0123456789abcdefghij", &config);
        let prompt = model.tokenize("0123").unwrap();
        let mut raw = [0u8; 64];
        let mut out = OutputBuffer::new(&mut raw);
        let (reason, tokens) = session
            .run(&model, &mut sampler, &config, &prompt, &mut out)
            .unwrap();
        assert_eq!(reason, FinishReason::Length);
        assert_eq!(tokens, 4);
        assert_eq!(out.as_str(), "4567");
    }

    #[test]
    fn buffer_overflow_aborts_the_run() {
        let config = greedy_config();
        let (model, mut session, mut sampler) =
            harness("0123456789abcdefghij", &config);
        let prompt = model.tokenize("0123").unwrap();
        let mut raw = [0u8; 4];
        let mut out = OutputBuffer::new(&mut raw);
        assert!(matches!(
            session.run(&model, &mut sampler, &config, &prompt, &mut out),
            Err(EngineError::BufferOverflow { capacity: 4 })
        ));
    }
}
