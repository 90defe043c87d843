//! Guided loss for erasing or enhancing a concept
//!
//! Training pulls the target latents toward a reference shifted along the
//! positive-minus-unconditional direction:
//!
//! ```text
//! erase:   R = neutral - g * (positive - unconditional)
//! enhance: R = neutral + g * (positive - unconditional)
//! loss   = loss_fn(target, R)
//! ```

use crate::{Action, ConceptError, LatentTensor, LossFn, PromptCache, PromptSettings, Result};
use std::sync::Arc;
use tracing::debug;

impl Action {
    /// Guidance-shifted reference latent for this action
    pub fn reference(
        &self,
        positive: &LatentTensor,
        unconditional: &LatentTensor,
        neutral: &LatentTensor,
        guidance_scale: f32,
    ) -> Result<LatentTensor> {
        let direction = positive.sub(unconditional)?.scale(guidance_scale);
        match self {
            Self::Erase => neutral.sub(&direction),
            Self::Enhance => neutral.add(&direction),
        }
    }
}

/// Compare `target` against the reference for `action`.
///
/// The value returned by `loss_fn` is passed through untouched.
pub fn guided_loss<L: LossFn + ?Sized>(
    target: &LatentTensor,
    positive: &LatentTensor,
    unconditional: &LatentTensor,
    neutral: &LatentTensor,
    guidance_scale: f32,
    action: Action,
    loss_fn: &L,
) -> Result<f32> {
    let reference = action.reference(positive, unconditional, neutral, guidance_scale)?;
    loss_fn.compare(target, &reference)
}

/// Latents predicted under each of the four prompts for one training step
#[derive(Debug, Clone, Copy)]
pub struct GuidanceLatents<'a> {
    /// Prediction of the model being trained, conditioned on the target
    pub target: &'a LatentTensor,
    /// Frozen prediction conditioned on the positive prompt
    pub positive: &'a LatentTensor,
    /// Frozen prediction conditioned on the unconditional prompt
    pub unconditional: &'a LatentTensor,
    /// Frozen prediction conditioned on the neutral prompt
    pub neutral: &'a LatentTensor,
}

/// One prompt setting bound to its embeddings and a loss function.
///
/// Embeddings are shared handles from the [`PromptCache`]; several pairs
/// may point at the same embedding.
pub struct PromptPair<L: LossFn> {
    target: Arc<LatentTensor>,
    positive: Arc<LatentTensor>,
    unconditional: Arc<LatentTensor>,
    neutral: Arc<LatentTensor>,

    guidance_scale: f32,
    resolution: u32,
    dynamic_resolution: bool,
    batch_size: u32,
    action: Action,

    loss_fn: L,
}

impl<L: LossFn> PromptPair<L> {
    /// Bind a setting to embeddings already in `cache`
    pub fn from_cache(settings: &PromptSettings, cache: &PromptCache, loss_fn: L) -> Result<Self> {
        let lookup = |prompt: &str| {
            cache.get(prompt).ok_or_else(|| {
                ConceptError::Embedding(format!("no cached embedding for prompt '{}'", prompt))
            })
        };

        let pair = Self {
            target: lookup(settings.target())?,
            positive: lookup(settings.positive())?,
            unconditional: lookup(settings.unconditional())?,
            neutral: lookup(settings.neutral())?,
            guidance_scale: settings.guidance_scale(),
            resolution: settings.resolution(),
            dynamic_resolution: settings.dynamic_resolution(),
            batch_size: settings.batch_size(),
            action: settings.action(),
            loss_fn,
        };

        debug!("Built {} pair for '{}'", pair.action, settings.target());
        Ok(pair)
    }

    /// Guided loss for one step's latents
    pub fn loss(&self, latents: &GuidanceLatents<'_>) -> Result<f32> {
        guided_loss(
            latents.target,
            latents.positive,
            latents.unconditional,
            latents.neutral,
            self.guidance_scale,
            self.action,
            &self.loss_fn,
        )
    }

    pub fn target(&self) -> &Arc<LatentTensor> {
        &self.target
    }

    pub fn positive(&self) -> &Arc<LatentTensor> {
        &self.positive
    }

    pub fn unconditional(&self) -> &Arc<LatentTensor> {
        &self.unconditional
    }

    pub fn neutral(&self) -> &Arc<LatentTensor> {
        &self.neutral
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn guidance_scale(&self) -> f32 {
        self.guidance_scale
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn dynamic_resolution(&self) -> bool {
        self.dynamic_resolution
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }
}
