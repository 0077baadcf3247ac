//! Deterministic scripted backend for tests and CI.
//!
//! A dummy model file is the [`MAGIC`] prefix followed by a UTF-8
//! script. The model treats the script as the one document it knows:
//! at every position the scripted continuation gets a large logit
//! boost over hash-derived noise, and past the end of the script the
//! boost moves to EOS. Generation is therefore reproducible, cheap,
//! and independent of the thread-count hint, which makes the backend
//! a drop-in collaborator for exercising the engine without a real
//! model.

use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::backend::{DecodeState, ExecutionBackend, ModelExecution, TokenId};
use crate::error::{EngineError, Result};

/// Magic prefix identifying a dummy model file.
pub const MAGIC: &[u8; 8] = b"TGDUMMY\0";

const N_VOCAB: usize = 128;
const TOKEN_EOS: TokenId = 0;
/// Logit boost applied to the scripted token at each position.
const SCRIPT_BOOST: f32 = 16.0;

/// Backend that loads script files written by [`write_model`].
pub struct DummyBackend;

impl ExecutionBackend for DummyBackend {
    fn name(&self) -> &str {
        "dummy"
    }

    fn load_model(&self, path: &Path) -> Result<Arc<dyn ModelExecution>> {
        let bytes = fs::read(path).map_err(|e| EngineError::ModelLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let Some(body) = bytes.strip_prefix(MAGIC.as_slice()) else {
            return Err(EngineError::ModelLoadFailed {
                path: path.display().to_string(),
                reason: "unrecognized model format".into(),
            });
        };
        let script_text =
            std::str::from_utf8(body).map_err(|_| EngineError::ModelLoadFailed {
                path: path.display().to_string(),
                reason: "script is not valid UTF-8".into(),
            })?;

        let script: Arc<[TokenId]> = script_text.chars().map(char_to_id).collect();
        info!(path = %path.display(), script_tokens = script.len(), "Dummy model loaded");
        Ok(Arc::new(DummyModel { script }))
    }
}

/// Write a dummy model file whose generations follow `script`.
pub fn write_model(path: &Path, script: &str) -> std::io::Result<()> {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(script.as_bytes());
    fs::write(path, bytes)
}

/// Char-level vocabulary: ASCII scalar values, with everything else
/// collapsed to `'?'`. Id 0 is reserved for EOS.
fn char_to_id(c: char) -> TokenId {
    if c.is_ascii() && c != '\0' {
        c as TokenId
    } else {
        b'?' as TokenId
    }
}

struct DummyModel {
    script: Arc<[TokenId]>,
}

#[cfg(test)]
pub(crate) fn model_from_script(script: &str) -> Arc<dyn ModelExecution> {
    Arc::new(DummyModel {
        script: script.chars().map(char_to_id).collect(),
    })
}

impl ModelExecution for DummyModel {
    fn n_vocab(&self) -> usize {
        N_VOCAB
    }

    fn token_eos(&self) -> TokenId {
        TOKEN_EOS
    }

    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(text.chars().map(char_to_id).collect())
    }

    fn token_to_piece(&self, token: TokenId) -> String {
        match u8::try_from(token) {
            Ok(b) if b != 0 && b.is_ascii() => (b as char).to_string(),
            _ => String::new(),
        }
    }

    fn new_state(&self, ctx_size: usize) -> Result<Box<dyn DecodeState>> {
        Ok(Box::new(DummyState {
            script: Arc::clone(&self.script),
            ctx_size,
            n_past: 0,
            logits: vec![0.0; N_VOCAB],
        }))
    }

    fn describe(&self) -> String {
        format!("dummy scripted model ({} tokens)", self.script.len())
    }
}

struct DummyState {
    script: Arc<[TokenId]>,
    ctx_size: usize,
    n_past: usize,
    logits: Vec<f32>,
}

impl DecodeState for DummyState {
    fn feed(&mut self, tokens: &[TokenId], _threads: usize) -> Result<()> {
        if self.n_past + tokens.len() > self.ctx_size {
            return Err(EngineError::DecodeFailed(format!(
                "context window exhausted ({} + {} > {})",
                self.n_past,
                tokens.len(),
                self.ctx_size
            )));
        }
        self.n_past += tokens.len();

        let target = self
            .script
            .get(self.n_past)
            .copied()
            .unwrap_or(TOKEN_EOS);
        for (id, logit) in self.logits.iter_mut().enumerate() {
            *logit = position_noise(self.n_past, id);
        }
        self.logits[target as usize] += SCRIPT_BOOST;
        Ok(())
    }

    fn logits(&self) -> &[f32] {
        &self.logits
    }

    fn n_past(&self) -> usize {
        self.n_past
    }

    fn clear(&mut self) {
        self.n_past = 0;
    }
}

/// Stable pseudo-noise in `[0, 1)` keyed on (position, token id).
fn position_noise(pos: usize, token: usize) -> f32 {
    let mut hasher = DefaultHasher::new();
    (pos, token).hash(&mut hasher);
    (hasher.finish() % 1024) as f32 / 1024.0
}
