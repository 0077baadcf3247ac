//! Token selection: temperature scaling, top-k and nucleus filtering,
//! seeded categorical draw.

use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;

use crate::backend::TokenId;
use crate::config::GenerationConfig;
use crate::error::{EngineError, Result};

/// Stateful per-context token-selection policy.
///
/// Each draw advances the private random stream; samplers are never
/// shared across contexts.
pub struct Sampler {
    top_k: i32,
    top_p: f32,
    temperature: f32,
    seed: u64,
    rng: StdRng,
}

impl Sampler {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            top_k: config.top_k,
            top_p: config.top_p,
            temperature: config.temperature,
            seed: config.seed,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Rewind the random stream to the creation seed.
    ///
    /// Called at the start of every generation so that a repeated call
    /// with the same prompt reproduces the same token sequence.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Select the next token from a logit distribution over the vocabulary.
    ///
    /// Pipeline: temperature scaling (`<= 0` is greedy argmax), top-k cut
    /// (`<= 0` disabled), nucleus cut (`>= 1.0` disabled), then one draw
    /// from the renormalized remainder.
    pub fn sample(&mut self, logits: &[f32]) -> Result<TokenId> {
        if logits.is_empty() {
            return Err(EngineError::SamplerError("empty logit distribution".into()));
        }

        if self.temperature <= 0.0 {
            return Ok(argmax(logits));
        }

        // Softmax over temperature-scaled logits.
        let inv_t = 1.0 / self.temperature;
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut candidates: Vec<(TokenId, f32)> = logits
            .iter()
            .enumerate()
            .map(|(id, &l)| (id as TokenId, ((l - max) * inv_t).exp()))
            .collect();
        let total: f32 = candidates.iter().map(|(_, w)| w).sum();
        for (_, w) in &mut candidates {
            *w /= total;
        }

        candidates.sort_unstable_by(|a, b| b.1.total_cmp(&a.1));

        if self.top_k > 0 {
            candidates.truncate((self.top_k as usize).min(candidates.len()));
        }

        if self.top_p < 1.0 {
            // Smallest prefix of the renormalized candidates whose
            // cumulative probability reaches the threshold.
            let total: f32 = candidates.iter().map(|(_, w)| w).sum();
            let mut cumulative = 0.0;
            let mut keep = candidates.len();
            for (i, (_, w)) in candidates.iter().enumerate() {
                cumulative += w / total;
                if cumulative >= self.top_p {
                    keep = i + 1;
                    break;
                }
            }
            candidates.truncate(keep);
        }

        let dist = WeightedIndex::new(candidates.iter().map(|(_, w)| *w))
            .map_err(|e| EngineError::SamplerError(e.to_string()))?;
        Ok(candidates[dist.sample(&mut self.rng)].0)
    }
}

fn argmax(logits: &[f32]) -> TokenId {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &value) in logits.iter().enumerate() {
        if value > best_value {
            best_value = value;
            best = i;
        }
    }
    best as TokenId
}
