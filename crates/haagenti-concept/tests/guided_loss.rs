//! Property and end-to-end tests for the guided loss.
//!
//! Run with: cargo test -p haagenti-concept --test guided_loss

use proptest::prelude::*;

use haagenti_concept::{
    guided_loss, parse_prompts, populate_cache, Action, ConceptError, GuidanceLatents, L1Loss,
    LatentTensor, MseLoss, PromptCache, PromptEncoder, PromptFormat, PromptPair, Result,
};

/// Strategy for latents of a fixed length.
fn latent_strategy(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-10.0f32..10.0f32, len)
}

/// Positive, unconditional and neutral latents of one shared length.
fn triple_strategy() -> impl Strategy<Value = (Vec<f32>, Vec<f32>, Vec<f32>)> {
    (1usize..32).prop_flat_map(|len| {
        (
            latent_strategy(len),
            latent_strategy(len),
            latent_strategy(len),
        )
    })
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-3 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Property: doubling the guidance scale doubles the shift away from neutral.
    #[test]
    fn prop_guidance_scale_is_linear(
        (p, u, n) in triple_strategy(),
        scale in 0.1f32..8.0,
        action in prop_oneof![Just(Action::Erase), Just(Action::Enhance)],
    ) {
        let (p, u, n) = (LatentTensor::from_vec(p), LatentTensor::from_vec(u), LatentTensor::from_vec(n));

        let single = action.reference(&p, &u, &n, scale).unwrap();
        let double = action.reference(&p, &u, &n, scale * 2.0).unwrap();

        let shift = single.sub(&n).unwrap().l2_norm();
        let double_shift = double.sub(&n).unwrap().l2_norm();
        prop_assert!(close(double_shift, 2.0 * shift), "{} vs 2 * {}", double_shift, shift);
    }

    /// Property: erase and enhance references mirror each other across neutral.
    #[test]
    fn prop_erase_enhance_symmetric(
        (p, u, n) in triple_strategy(),
        scale in 0.0f32..8.0,
    ) {
        let (p, u, n) = (LatentTensor::from_vec(p), LatentTensor::from_vec(u), LatentTensor::from_vec(n));

        let erase = Action::Erase.reference(&p, &u, &n, scale).unwrap();
        let enhance = Action::Enhance.reference(&p, &u, &n, scale).unwrap();
        let midpoint = erase.add(&enhance).unwrap().scale(0.5);

        for (&m, &x) in midpoint.data().iter().zip(n.data()) {
            prop_assert!(close(m, x), "midpoint {} vs neutral {}", m, x);
        }
    }

    /// Property: with zero guidance both actions compare the target against neutral.
    #[test]
    fn prop_zero_scale_is_neutral(
        (p, u, n) in triple_strategy(),
    ) {
        let (p, u, n) = (LatentTensor::from_vec(p), LatentTensor::from_vec(u), LatentTensor::from_vec(n));
        let target = LatentTensor::zeros(n.shape().to_vec());

        let expected = mse(&target, &n);
        for action in [Action::Erase, Action::Enhance] {
            let loss = guided_loss(&target, &p, &u, &n, 0.0, action, &MseLoss).unwrap();
            prop_assert!(close(loss, expected));
        }
    }
}

/// Mean squared error computed without going through the engine.
fn mse(a: &LatentTensor, b: &LatentTensor) -> f32 {
    let sum: f32 = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    sum / a.numel() as f32
}

/// Encoder mapping each known prompt to a fixed one-element latent.
struct TableEncoder;

#[async_trait::async_trait]
impl PromptEncoder for TableEncoder {
    async fn encode(&self, text: &str) -> Result<LatentTensor> {
        let value = match text {
            "van gogh" => 2.0,
            "painting" => 1.0,
            "" => 0.0,
            other => return Err(ConceptError::Embedding(format!("unknown prompt '{}'", other))),
        };
        Ok(LatentTensor::from_vec(vec![value]))
    }
}

#[tokio::test]
async fn test_prompts_file_to_loss() {
    let yaml = r#"
- target: "van gogh"
- target: "van gogh"
  neutral: "painting"
  action: "enhance"
  guidance_scale: 2.0
"#;
    let settings = parse_prompts(yaml, PromptFormat::Yaml).unwrap();

    let mut cache = PromptCache::new();
    let encoded = populate_cache(&TableEncoder, &mut cache, &settings).await.unwrap();
    assert_eq!(encoded, 3);

    let erase = PromptPair::from_cache(&settings[0], &cache, L1Loss).unwrap();
    let enhance = PromptPair::from_cache(&settings[1], &cache, L1Loss).unwrap();

    // Both settings share the cached empty-prompt embedding
    assert!(std::sync::Arc::ptr_eq(erase.unconditional(), enhance.unconditional()));

    let target = LatentTensor::from_vec(vec![0.0]);
    let positive = LatentTensor::from_vec(vec![2.0]);
    let unconditional = LatentTensor::from_vec(vec![0.0]);
    let neutral = LatentTensor::from_vec(vec![1.0]);
    let latents = GuidanceLatents {
        target: &target,
        positive: &positive,
        unconditional: &unconditional,
        neutral: &neutral,
    };

    // erase:   R = 1 - 1 * (2 - 0) = -1
    assert_eq!(erase.loss(&latents).unwrap(), 1.0);
    // enhance: R = 1 + 2 * (2 - 0) = 5
    assert_eq!(enhance.loss(&latents).unwrap(), 5.0);
}
