//! Loss functions comparing two latent tensors

use crate::{LatentTensor, Result};

/// Scalar comparison between a prediction and its reference.
///
/// Implemented for any `Fn(&LatentTensor, &LatentTensor) -> Result<f32>`,
/// so closures can be passed wherever a loss is expected.
pub trait LossFn {
    fn compare(&self, prediction: &LatentTensor, reference: &LatentTensor) -> Result<f32>;
}

impl<F> LossFn for F
where
    F: Fn(&LatentTensor, &LatentTensor) -> Result<f32>,
{
    fn compare(&self, prediction: &LatentTensor, reference: &LatentTensor) -> Result<f32> {
        self(prediction, reference)
    }
}

/// Mean squared error
#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss;

impl LossFn for MseLoss {
    fn compare(&self, prediction: &LatentTensor, reference: &LatentTensor) -> Result<f32> {
        mean_of(prediction, reference, |d| d * d)
    }
}

/// Mean absolute error
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Loss;

impl LossFn for L1Loss {
    fn compare(&self, prediction: &LatentTensor, reference: &LatentTensor) -> Result<f32> {
        mean_of(prediction, reference, f32::abs)
    }
}

fn mean_of(a: &LatentTensor, b: &LatentTensor, f: impl Fn(f32) -> f32) -> Result<f32> {
    a.check_compatible(b)?;
    if a.numel() == 0 {
        return Ok(0.0);
    }

    let total: f32 = a.data().iter().zip(b.data()).map(|(&x, &y)| f(x - y)).sum();
    Ok(total / a.numel() as f32)
}
