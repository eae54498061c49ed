//! Per-dimension tag classification heads.

use candle_core::{D, Tensor};
use candle_nn::ops::log_softmax;
use candle_nn::{Linear, Module, VarBuilder, linear};

use crate::error::Result;

/// Independent linear + log-softmax heads, one per tag dimension.
///
/// Heads share no parameters and never condition on each other's
/// predictions; each maps a token's contextual representation to a
/// log-probability distribution over its own tag table.
#[derive(Debug)]
pub struct Classifier {
    heads: Vec<Linear>,
}

impl Classifier {
    /// Build one head per entry of `tag_sizes`, projecting from
    /// `context_dim` to that dimension's tag table size.
    pub fn new(context_dim: usize, tag_sizes: &[usize], vb: VarBuilder) -> Result<Self> {
        let mut heads = Vec::with_capacity(tag_sizes.len());
        for (d, &size) in tag_sizes.iter().enumerate() {
            heads.push(linear(context_dim, size, vb.pp(format!("head_{d}")))?);
        }
        Ok(Self { heads })
    }

    /// Number of classified dimensions.
    pub fn head_count(&self) -> usize {
        self.heads.len()
    }

    /// Map `(len, context_dim)` contextual vectors to one
    /// `(len, |tags_d|)` log-probability matrix per head.
    pub fn forward(&self, context: &Tensor) -> Result<Vec<Tensor>> {
        let mut scores = Vec::with_capacity(self.heads.len());
        for head in &self.heads {
            let logits = head.forward(context)?;
            scores.push(log_softmax(&logits, D::Minus1)?);
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn classifier(context_dim: usize, tag_sizes: &[usize]) -> Classifier {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        Classifier::new(context_dim, tag_sizes, vb).unwrap()
    }

    fn context(len: usize, dim: usize) -> Tensor {
        let values: Vec<f32> = (0..len * dim).map(|i| (i as f32 * 0.3).cos()).collect();
        Tensor::from_vec(values, (len, dim), &Device::Cpu).unwrap()
    }

    #[test]
    fn one_score_matrix_per_dimension() {
        let clf = classifier(6, &[4, 3, 11]);
        let scores = clf.forward(&context(5, 6)).unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].dims(), &[5, 4]);
        assert_eq!(scores[2].dims(), &[5, 11]);
    }

    #[test]
    fn rows_are_valid_probability_distributions() {
        let clf = classifier(6, &[4, 9]);
        let scores = clf.forward(&context(7, 6)).unwrap();
        for matrix in &scores {
            let sums = matrix
                .exp()
                .unwrap()
                .sum(D::Minus1)
                .unwrap()
                .to_vec1::<f32>()
                .unwrap();
            for sum in sums {
                assert!((sum - 1.0).abs() < 1e-5, "row mass {sum}");
            }
        }
    }
}
