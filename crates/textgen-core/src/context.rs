//! Per-session generation context.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::buffer::OutputBuffer;
use crate::config::GenerationConfig;
use crate::error::{EngineError, Result};
use crate::model::ModelHandle;
use crate::prompt::PromptFormat;
use crate::sampler::Sampler;
use crate::session::{GenerateReport, Session};

/// Owned, reusable generation context.
///
/// Holds the model reference, the seeded sampler, the decode state sized
/// to `ctx_size`, and the mutable configuration. Dropping the context
/// releases all of it; the model itself is freed when its last context
/// goes away.
///
/// `generate` and every setter take `&mut self`, so a context can never
/// run two generations at once nor interleave a setter with a running
/// call. Callers that want parallel generation create one context each,
/// optionally sharing the model.
pub struct Context {
    model: Arc<ModelHandle>,
    config: GenerationConfig,
    sampler: Sampler,
    session: Session,
    prompt_format: Option<PromptFormat>,
}

impl Context {
    pub(crate) fn new(model: Arc<ModelHandle>, config: GenerationConfig) -> Result<Self> {
        config.validate()?;
        let state = model.new_state(config.ctx_size as usize)?;
        let sampler = Sampler::new(&config);
        debug!(
            path = %model.path().display(),
            ctx_size = config.ctx_size,
            "Context created"
        );
        Ok(Self {
            session: Session::new(state, config.ctx_size as usize),
            sampler,
            model,
            config,
            prompt_format: None,
        })
    }

    //  Accessors

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    pub fn prompt_format(&self) -> Option<&str> {
        self.prompt_format.as_ref().map(PromptFormat::template)
    }

    //  Runtime tuning

    /// Change the per-call completion budget.
    ///
    /// Takes effect on the next `generate` call, as do all setters.
    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<()> {
        if max_tokens == 0 {
            return Err(EngineError::InvalidConfig("max_tokens must be positive".into()));
        }
        self.config.max_tokens = max_tokens;
        Ok(())
    }

    /// Change the execution-parallelism hint.
    pub fn set_threads(&mut self, threads: u32) -> Result<()> {
        if threads == 0 {
            return Err(EngineError::InvalidConfig("threads must be positive".into()));
        }
        self.config.threads = threads;
        Ok(())
    }

    /// Change the prompt-priming batch size.
    pub fn set_batch_size(&mut self, batch: u32) -> Result<()> {
        if batch == 0 {
            return Err(EngineError::InvalidConfig("batch must be positive".into()));
        }
        self.config.batch = batch;
        Ok(())
    }

    /// Wrap every subsequent prompt in `template`, which must contain the
    /// `{prompt}` placeholder. An empty template clears the format.
    pub fn set_prompt_format(&mut self, template: &str) -> Result<()> {
        if template.is_empty() {
            self.clear_prompt_format();
            return Ok(());
        }
        self.prompt_format = Some(PromptFormat::new(template)?);
        Ok(())
    }

    /// Revert to raw-prompt mode.
    pub fn clear_prompt_format(&mut self) {
        self.prompt_format = None;
    }

    //  Generation

    /// Produce one completion for `prompt` into `out`, blocking until a
    /// stop condition is reached.
    ///
    /// On success the first `report.bytes_written` bytes of `out` hold
    /// the completion. On error the buffer contents are unspecified and
    /// must be discarded; a completion that does not fit `out` is an
    /// error ([`EngineError::BufferOverflow`]), never a partial result.
    pub fn generate(&mut self, prompt: &str, out: &mut [u8]) -> Result<GenerateReport> {
        let started = Instant::now();

        let wrapped;
        let visible = match &self.prompt_format {
            Some(format) => {
                wrapped = format.apply(prompt);
                wrapped.as_str()
            }
            None => prompt,
        };

        let tokens = self.model.tokenize(visible)?;
        debug!(
            prompt_tokens = tokens.len(),
            max_tokens = self.config.max_tokens,
            "Generation started"
        );

        // Same seed, same prompt, same bytes out: rewind the random
        // stream before every run.
        self.sampler.reset();

        let mut buffer = OutputBuffer::new(out);
        let (finish_reason, completion_tokens) = self.session.run(
            &self.model,
            &mut self.sampler,
            &self.config,
            &tokens,
            &mut buffer,
        )?;

        let report = GenerateReport {
            finish_reason,
            prompt_tokens: tokens.len() as u32,
            completion_tokens,
            bytes_written: buffer.written(),
            elapsed: started.elapsed(),
        };
        debug!(
            reason = %report.finish_reason,
            completion_tokens = report.completion_tokens,
            bytes = report.bytes_written,
            "Generation finished"
        );
        Ok(report)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        debug!("Freeing context");
    }
}
