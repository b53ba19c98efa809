//! Fused scaled-dot-product attention kernels.
//!
//! Kernels operate on the head-major layout `[batch, heads, seq_len, head_dim]`.
//! The dense strategy owns conversion from and to the token-major layout.

use std::fmt;

use candle_core::{DType, Tensor};

use super::mask::{additive_bias, causal_mask};
use crate::error::Result;

/// Scaled-dot-product attention over head-major tensors.
///
/// `mask` is already normalized to rank 4 and broadcastable to
/// `[batch, heads, q_len, k_len]`. When both `mask` and `causal` are given
/// the kernel decides how they combine.
pub trait ScaledDotProductKernel: Send + Sync + fmt::Debug {
    /// Compute `softmax(Q Kᵀ · scale + bias) V`.
    fn forward(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
        dropout_rate: f32,
        causal: bool,
    ) -> Result<Tensor>;
}

/// Portable candle implementation of scaled-dot-product attention.
///
/// Reductions run in `f32`; the output is cast back to the query dtype.
/// An explicit mask and the causal flag intersect: a position is attended
/// only if both allow it. Rows where every key is masked have no defined value.
#[derive(Debug, Clone, Default)]
pub struct CandleSdpa {
    /// Softmax scale; `1/sqrt(head_dim)` when `None`.
    scale: Option<f64>,
}

impl CandleSdpa {
    /// Kernel with the default `1/sqrt(head_dim)` scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernel with a fixed softmax scale.
    pub fn with_scale(scale: f64) -> Self {
        Self { scale: Some(scale) }
    }
}

impl ScaledDotProductKernel for CandleSdpa {
    fn forward(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
        dropout_rate: f32,
        causal: bool,
    ) -> Result<Tensor> {
        let dtype = query.dtype();
        let (batch, heads, q_len, head_dim) = query.dims4()?;
        let k_len = key.dim(2)?;
        let scale = self
            .scale
            .unwrap_or_else(|| 1.0 / (head_dim as f64).sqrt());

        let q = query.to_dtype(DType::F32)?.contiguous()?;
        let k = key.to_dtype(DType::F32)?.contiguous()?;
        let v = value.to_dtype(DType::F32)?.contiguous()?;

        let mut scores = (q.matmul(&k.transpose(2, 3)?)? * scale)?;
        let shape = [batch, heads, q_len, k_len];

        if let Some(mask) = mask {
            scores = (scores + additive_bias(mask, &shape)?)?;
        }
        if causal {
            let allowed = causal_mask(q_len, k_len, query.device())?;
            scores = (scores + additive_bias(&allowed, &shape)?)?;
        }

        let mut probs = candle_nn::ops::softmax_last_dim(&scores.contiguous()?)?;
        if dropout_rate > 0.0 {
            probs = candle_nn::ops::dropout(&probs, dropout_rate)?;
        }

        let output = probs.matmul(&v)?;
        Ok(output.to_dtype(dtype)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn naive(q: &Tensor, k: &Tensor, v: &Tensor, bias: Option<&[f32]>) -> Vec<f32> {
        let (batch, heads, q_len, head_dim) = q.dims4().unwrap();
        let k_len = k.dim(2).unwrap();
        let q = q.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        let k = k.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        let v = v.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        let scale = 1.0 / (head_dim as f32).sqrt();
        let mut out = vec![0f32; batch * heads * q_len * head_dim];

        for bh in 0..batch * heads {
            for i in 0..q_len {
                let mut row: Vec<f32> = (0..k_len)
                    .map(|j| {
                        let dot: f32 = (0..head_dim)
                            .map(|d| {
                                q[(bh * q_len + i) * head_dim + d] * k[(bh * k_len + j) * head_dim + d]
                            })
                            .sum();
                        dot * scale + bias.map_or(0.0, |b| b[i * k_len + j])
                    })
                    .collect();
                let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                let mut denom = 0.0;
                for x in row.iter_mut() {
                    *x = (*x - max).exp();
                    denom += *x;
                }
                for d in 0..head_dim {
                    let acc: f32 = (0..k_len)
                        .map(|j| row[j] / denom * v[(bh * k_len + j) * head_dim + d])
                        .sum();
                    out[(bh * q_len + i) * head_dim + d] = acc;
                }
            }
        }
        out
    }

    fn inputs(device: &Device) -> (Tensor, Tensor, Tensor) {
        let q: Vec<f32> = (0..48).map(|i| ((i % 7) as f32) * 0.1).collect();
        let k: Vec<f32> = (0..64).map(|i| ((i % 5) as f32) * 0.2 - 0.3).collect();
        let v: Vec<f32> = (0..64).map(|i| i as f32 * 0.05).collect();
        (
            Tensor::from_vec(q, (1, 2, 3, 8), device).unwrap(),
            Tensor::from_vec(k, (1, 2, 4, 8), device).unwrap(),
            Tensor::from_vec(v, (1, 2, 4, 8), device).unwrap(),
        )
    }

    fn max_diff(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn matches_naive_attention() {
        let device = Device::Cpu;
        let (q, k, v) = inputs(&device);
        let out = CandleSdpa::new()
            .forward(&q, &k, &v, None, 0.0, false)
            .unwrap();
        assert_eq!(out.dims(), &[1, 2, 3, 8]);
        let got = out.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert!(max_diff(&got, &naive(&q, &k, &v, None)) < 1e-5);
    }

    #[test]
    fn causal_matches_naive_with_triangular_bias() {
        let device = Device::Cpu;
        let (q, k, v) = inputs(&device);
        let out = CandleSdpa::new()
            .forward(&q, &k, &v, None, 0.0, true)
            .unwrap();
        let mut bias = vec![0f32; 3 * 4];
        for i in 0..3 {
            for j in (i + 1)..4 {
                bias[i * 4 + j] = f32::NEG_INFINITY;
            }
        }
        let got = out.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert!(max_diff(&got, &naive(&q, &k, &v, Some(&bias))) < 1e-5);
    }

    #[test]
    fn mask_and_causal_intersect() {
        let device = Device::Cpu;
        let (q, k, v) = inputs(&device);
        // Hide key 0 everywhere; causal hides the upper triangle.
        let mask = Tensor::from_vec(vec![0u8, 1, 1, 1], (1, 1, 1, 4), &device).unwrap();
        let out = CandleSdpa::new()
            .forward(&q, &k, &v, Some(&mask), 0.0, true)
            .unwrap();
        let values = out.flatten_all().unwrap().to_vec1::<f32>().unwrap();

        // Query 1 sees exactly key 1, so its output is value row 1.
        let v_rows = v.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert!(max_diff(&values[8..16], &v_rows[8..16]) < 1e-5);
    }

    #[test]
    fn reduced_precision_returns_input_dtype() {
        let device = Device::Cpu;
        let (q, k, v) = inputs(&device);
        let reference = CandleSdpa::new()
            .forward(&q, &k, &v, None, 0.0, false)
            .unwrap();
        for dtype in [DType::F16, DType::BF16] {
            let out = CandleSdpa::new()
                .forward(
                    &q.to_dtype(dtype).unwrap(),
                    &k.to_dtype(dtype).unwrap(),
                    &v.to_dtype(dtype).unwrap(),
                    None,
                    0.0,
                    false,
                )
                .unwrap();
            assert_eq!(out.dtype(), dtype);
            let diff = out
                .to_dtype(DType::F32)
                .unwrap()
                .sub(&reference)
                .unwrap()
                .abs()
                .unwrap()
                .max_all()
                .unwrap()
                .to_vec0::<f32>()
                .unwrap();
            assert!(diff < 5e-2, "dtype {dtype:?} diverged by {diff}");
        }
    }

    #[test]
    fn custom_scale_is_used() {
        let device = Device::Cpu;
        let (q, k, v) = inputs(&device);
        // A zero scale makes every key equally likely.
        let out = CandleSdpa::with_scale(0.0)
            .forward(&q, &k, &v, None, 0.0, false)
            .unwrap();
        let mean = v.mean_keepdim(2).unwrap().broadcast_as((1, 2, 3, 8)).unwrap();
        let diff = out
            .sub(&mean)
            .unwrap()
            .abs()
            .unwrap()
            .max_all()
            .unwrap()
            .to_vec0::<f32>()
            .unwrap();
        assert!(diff < 1e-5);
    }
}
