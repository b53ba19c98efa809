//! Single-device dense attention.

use candle_core::Tensor;

use super::backend::{AttentionBackendKind, AttentionOptions, AttentionStrategy};
use super::kernel::{CandleSdpa, ScaledDotProductKernel};
use super::mask::{normalize_mask, MaskTarget};
use super::shape::check_qkv;
use crate::error::Result;

/// Dense attention on the device the inputs already live on.
///
/// Inputs arrive token-major (`[batch, seq_len, heads, head_dim]`); the
/// kernel runs head-major and the result is transposed back, so the output
/// always has the query's shape.
///
/// # Example
///
/// ```rust,ignore
/// use vidattn_core::attention::{AttentionOptions, AttentionStrategy, DenseAttention};
///
/// let dense = DenseAttention::new();
/// let out = dense.attend(&q, &k, &v, None, &AttentionOptions::new().with_causal(true))?;
/// assert_eq!(out.dims(), q.dims());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DenseAttention<K = CandleSdpa> {
    kernel: K,
}

impl DenseAttention {
    /// Dense attention backed by the portable candle kernel.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: ScaledDotProductKernel> DenseAttention<K> {
    /// Dense attention backed by a caller-supplied kernel.
    pub fn with_kernel(kernel: K) -> Self {
        Self { kernel }
    }

    /// The kernel this strategy delegates to.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl<K: ScaledDotProductKernel> AttentionStrategy for DenseAttention<K> {
    fn kind(&self) -> AttentionBackendKind {
        AttentionBackendKind::LocalDense
    }

    fn attend(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
        options: &AttentionOptions,
    ) -> Result<Tensor> {
        options.validate()?;
        let dims = check_qkv(query, key, value)?;

        let mask = mask
            .map(|mask| {
                let target = MaskTarget {
                    batch: dims.batch,
                    heads: dims.heads,
                    q_len: dims.q_len,
                    k_len: dims.k_len,
                };
                normalize_mask(mask, query.dtype(), target)
            })
            .transpose()?;

        tracing::trace!(
            batch = dims.batch,
            q_len = dims.q_len,
            k_len = dims.k_len,
            heads = dims.heads,
            head_dim = dims.head_dim,
            masked = mask.is_some(),
            causal = options.causal,
            "dense attention"
        );

        let q = query.transpose(1, 2)?.contiguous()?;
        let k = key.transpose(1, 2)?.contiguous()?;
        let v = value.transpose(1, 2)?.contiguous()?;

        let output = self.kernel.forward(
            &q,
            &k,
            &v,
            mask.as_ref(),
            options.dropout_rate,
            options.causal,
        )?;

        Ok(output.transpose(1, 2)?.contiguous()?)
    }
}
