//! Prompt encoder interface and cache population

use crate::{LatentTensor, PromptCache, PromptSettings, Result};
use std::collections::HashSet;
use tracing::{debug, info};

/// Text encoder producing prompt embeddings
#[async_trait::async_trait]
pub trait PromptEncoder: Send + Sync {
    /// Embed a single prompt
    async fn encode(&self, text: &str) -> Result<LatentTensor>;
}

/// Every prompt text referenced by `settings`, deduplicated in first-seen order
pub fn distinct_prompts(settings: &[PromptSettings]) -> Vec<String> {
    let mut seen = HashSet::new();
    settings
        .iter()
        .flat_map(|s| s.prompts())
        .filter(|prompt| seen.insert(*prompt))
        .map(str::to_string)
        .collect()
}

/// Encode each prompt of `settings` that `cache` does not hold yet.
///
/// Returns the number of prompts encoded. Stops at the first encoder error;
/// embeddings stored before the failure stay cached.
pub async fn populate_cache<E: PromptEncoder + ?Sized>(
    encoder: &E,
    cache: &mut PromptCache,
    settings: &[PromptSettings],
) -> Result<usize> {
    let mut encoded = 0;

    for prompt in distinct_prompts(settings) {
        if cache.contains(&prompt) {
            continue;
        }

        let embedding = encoder.encode(&prompt).await?;
        debug!("Encoded '{}' to shape {:?}", prompt, embedding.shape());
        cache.put(prompt, embedding);
        encoded += 1;
    }

    info!(
        "Prompt cache holds {} embeddings ({} newly encoded)",
        cache.len(),
        encoded
    );
    Ok(encoded)
}

/// Deterministic encoder for tests
#[cfg(test)]
pub struct MockPromptEncoder {
    dim: usize,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockPromptEncoder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl PromptEncoder for MockPromptEncoder {
    async fn encode(&self, text: &str) -> Result<LatentTensor> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        if text == "<fail>" {
            return Err(crate::ConceptError::Embedding("encoder rejected prompt".into()));
        }
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let data = (0..self.dim)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                (state as f32 / u64::MAX as f32) * 2.0 - 1.0
            })
            .collect();

        LatentTensor::new(vec![self.dim], data)
    }
}
