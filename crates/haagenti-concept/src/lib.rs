//! Concept erasing and enhancing for diffusion fine-tuning
//!
//! This crate provides the prompt-side pieces of concept editing:
//! - Resolution of raw prompt records into fully defaulted [`PromptSettings`]
//! - Loading prompt records from YAML or JSON files
//! - A prompt embedding cache shared across training steps
//! - The guided loss that bends a reference latent away from ("erase") or
//!   toward ("enhance") a concept
//!
//! # Data Flow
//!
//! ```text
//! prompts.yaml ──> resolve ──> PromptSettings ──> PromptEncoder ──> PromptCache
//!                                    │                                  │
//!                                    └──────────> PromptPair <──────────┘
//!                                                     │
//!                           step latents ──> guided_loss ──> f32
//! ```
//!
//! Text encoding, the optimizer loop and the model itself live elsewhere;
//! the encoder and the loss function are injected.

mod cache;
mod encoder;
mod error;
mod guidance;
mod loader;
mod loss;
mod settings;
mod tensor;

pub use cache::{CacheStats, PromptCache, SharedPromptCache};
pub use encoder::{distinct_prompts, populate_cache, PromptEncoder};
pub use error::{ConceptError, Result};
pub use guidance::{guided_loss, GuidanceLatents, PromptPair};
pub use loader::{load_prompts_from_file, parse_prompts, PromptFormat};
pub use loss::{L1Loss, LossFn, MseLoss};
pub use settings::{
    resolve, Action, PromptSettings, RawRecord, DEFAULT_BATCH_SIZE, DEFAULT_GUIDANCE_SCALE,
    DEFAULT_RESOLUTION,
};
pub use tensor::LatentTensor;

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        guided_loss, load_prompts_from_file, Action, LatentTensor, LossFn, PromptCache,
        PromptEncoder, PromptPair, PromptSettings, Result,
    };
}
