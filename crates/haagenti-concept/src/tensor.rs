//! Dense latent tensors

use crate::{ConceptError, Result};
use serde::{Deserialize, Serialize};

/// Latent embedding or latent prediction, stored flat in row-major order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentTensor {
    /// Tensor shape
    shape: Vec<usize>,
    /// Flattened data
    data: Vec<f32>,
}

impl LatentTensor {
    /// Create a tensor, checking that the data fills the shape
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected_size: usize = shape.iter().product();
        if data.len() != expected_size {
            return Err(ConceptError::ShapeMismatch {
                expected: vec![expected_size],
                got: vec![data.len()],
            });
        }

        Ok(Self { shape, data })
    }

    /// One-dimensional tensor
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Zero tensor
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size: usize = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; size],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of elements
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Element-wise add
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise subtract
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Scalar multiply
    pub fn scale(&self, factor: f32) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|x| x * factor).collect(),
        }
    }

    /// L2 norm
    pub fn l2_norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Shape check shared by all binary operations
    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.shape != other.shape {
            return Err(ConceptError::ShapeMismatch {
                expected: self.shape.clone(),
                got: other.shape.clone(),
            });
        }
        Ok(())
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Result<Self> {
        self.check_compatible(other)?;
        Ok(Self {
            shape: self.shape.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }
}
