//! Pooling strategies for embedding extraction.

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

/// Pooling strategy for converting token embeddings to sentence embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolingStrategy {
    /// Sum of all token vectors (excluding padding), special tokens included
    #[default]
    Sum,

    /// Mean pooling over all tokens (excluding padding)
    Mean,

    /// Use [CLS] token embedding
    Cls,

    /// Max pooling over all tokens
    Max,
}

impl PoolingStrategy {
    /// Apply pooling to token embeddings.
    ///
    /// # Arguments
    /// * `embeddings` - Tensor of shape (batch_size, seq_len, hidden_dim)
    /// * `attention_mask` - F32 tensor of shape (batch_size, seq_len)
    ///
    /// # Returns
    /// Tensor of shape (batch_size, hidden_dim)
    pub fn apply(&self, embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            PoolingStrategy::Sum => sum_pool(embeddings, attention_mask),
            PoolingStrategy::Mean => mean_pool(embeddings, attention_mask),
            PoolingStrategy::Cls => cls_pool(embeddings),
            PoolingStrategy::Max => max_pool(embeddings, attention_mask),
        }
    }
}

/// Sum of non-padding token vectors.
fn sum_pool(embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask_expanded = attention_mask
        .unsqueeze(2)?
        .expand(embeddings.shape())?;
    (embeddings * &mask_expanded)?.sum(1)
}

/// Mean pooling over non-padding tokens.
fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let sum_embeddings = sum_pool(embeddings, attention_mask)?;

    // clamp to avoid division by zero
    let sum_mask = attention_mask
        .unsqueeze(2)?
        .sum(1)?
        .clamp(1e-9f32, f32::MAX)?;

    sum_embeddings.broadcast_div(&sum_mask)
}

/// Extract [CLS] token embedding (first token).
fn cls_pool(embeddings: &Tensor) -> candle_core::Result<Tensor> {
    embeddings.narrow(1, 0, 1)?.squeeze(1)
}

/// Max pooling over non-padding tokens.
fn max_pool(embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask_expanded = attention_mask
        .unsqueeze(2)?
        .expand(embeddings.shape())?;

    // mask - 1 is 0 for real tokens and -1 for padding
    let mask_offset = (&mask_expanded - 1.0)?;
    let large_pos = Tensor::new(1e9f32, embeddings.device())?;
    let mask_values = mask_offset.broadcast_mul(&large_pos)?;
    let masked_embeddings = embeddings.broadcast_add(&mask_values)?;

    masked_embeddings.max(1)
}

/// L2 normalize embeddings.
pub fn l2_normalize(embeddings: &Tensor) -> candle_core::Result<Tensor> {
    // embeddings: (batch, hidden_dim)
    let norms = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norms_clamped = norms.clamp(1e-9f32, f32::MAX)?;
    embeddings.broadcast_div(&norms_clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn fixture() -> (Tensor, Tensor) {
        let device = Device::Cpu;

        // 2 sequences, 3 tokens each, 4-dim embeddings
        let embeddings = Tensor::from_vec(
            vec![
                // Seq 1
                1.0f32, 2.0, 3.0, 4.0,
                2.0, 3.0, 4.0, 5.0,
                3.0, 4.0, 5.0, 6.0,
                // Seq 2
                1.0, 1.0, 1.0, 1.0,
                2.0, 2.0, 2.0, 2.0,
                9.0, 9.0, 9.0, 9.0,  // padding
            ],
            (2, 3, 4),
            &device,
        ).unwrap();

        let attention_mask = Tensor::from_vec(
            vec![1.0f32, 1.0, 1.0,
                 1.0, 1.0, 0.0],
            (2, 3),
            &device,
        ).unwrap();

        (embeddings, attention_mask)
    }

    #[test]
    fn test_sum_pool() {
        let (embeddings, mask) = fixture();
        let result = PoolingStrategy::Sum.apply(&embeddings, &mask).unwrap()
            .to_vec2::<f32>().unwrap();

        assert_eq!(result[0], vec![6.0, 9.0, 12.0, 15.0]);
        // padding row is ignored
        assert_eq!(result[1], vec![3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_mean_pool() {
        let (embeddings, mask) = fixture();
        let result = PoolingStrategy::Mean.apply(&embeddings, &mask).unwrap()
            .to_vec2::<f32>().unwrap();

        assert!((result[0][0] - 2.0).abs() < 1e-5);
        assert!((result[0][1] - 3.0).abs() < 1e-5);
        assert!((result[1][0] - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_cls_pool() {
        let (embeddings, mask) = fixture();
        let result = PoolingStrategy::Cls.apply(&embeddings, &mask).unwrap()
            .to_vec2::<f32>().unwrap();

        assert_eq!(result[0], vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(result[1], vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_max_pool_skips_padding() {
        let (embeddings, mask) = fixture();
        let result = PoolingStrategy::Max.apply(&embeddings, &mask).unwrap()
            .to_vec2::<f32>().unwrap();

        assert!((result[0][3] - 6.0).abs() < 1e-3);
        assert!((result[1][0] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_l2_normalize() {
        let device = Device::Cpu;

        let embeddings = Tensor::from_vec(
            vec![3.0f32, 4.0, 0.0, 0.0,  // norm = 5
                 1.0, 1.0, 1.0, 1.0], // norm = 2
            (2, 4),
            &device,
        ).unwrap();

        let normalized = l2_normalize(&embeddings).unwrap();
        let result = normalized.to_vec2::<f32>().unwrap();

        assert!((result[0][0] - 0.6).abs() < 1e-5);
        assert!((result[0][1] - 0.8).abs() < 1e-5);

        for row in result {
            let norm: f32 = row.iter().map(|x| x * x).sum();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }
}
