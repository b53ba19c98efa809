//! Attention mask classification, normalization and builders.
//!
//! Candle has no boolean dtype, so boolean masks are `U8` tensors where a
//! non-zero entry means "may attend". Every other dtype is treated as an
//! additive bias (`0.0` keep, `-inf` discard) added to the attention scores.

use candle_core::{DType, Device, Tensor};

use crate::error::{AttentionError, Result, TensorShape};

/// Dtype used for boolean allow/deny masks.
pub const BOOL_MASK_DTYPE: DType = DType::U8;

/// How a mask participates in the attention scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    /// Hard allow/deny; never cast.
    Boolean,
    /// Additive bias; cast to the compute dtype.
    Additive,
}

impl MaskKind {
    /// Classify a mask by its dtype.
    pub fn of(mask: &Tensor) -> Self {
        if mask.dtype() == BOOL_MASK_DTYPE {
            Self::Boolean
        } else {
            Self::Additive
        }
    }
}

/// Target layout a mask is normalized against: `[batch, heads, q_len, k_len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskTarget {
    /// Batch size.
    pub batch: usize,
    /// Number of heads.
    pub heads: usize,
    /// Query sequence length.
    pub q_len: usize,
    /// Key sequence length.
    pub k_len: usize,
}

impl MaskTarget {
    fn dims(&self) -> [usize; 4] {
        [self.batch, self.heads, self.q_len, self.k_len]
    }
}

fn broadcastable(observed: &[usize], expected: &[usize]) -> bool {
    observed.len() == expected.len()
        && observed
            .iter()
            .zip(expected)
            .all(|(&got, &want)| got == want || got == 1)
}

/// Normalize a caller mask into a rank-4 tensor broadcastable to `target`.
///
/// * Additive masks are cast to `compute_dtype`; boolean masks keep `U8`.
/// * Rank-3 masks `[batch, q_len, k_len]` are replicated across heads.
/// * Rank-2 masks `[q_len, k_len]` gain two leading unit axes.
/// * Rank-4 masks are checked and passed through.
///
/// The input is never modified; a new tensor is returned.
pub fn normalize_mask(mask: &Tensor, compute_dtype: DType, target: MaskTarget) -> Result<Tensor> {
    let dims = mask.dims();
    let [batch, heads, q_len, k_len] = target.dims();
    let ok = match dims.len() {
        4 => broadcastable(dims, &target.dims()),
        3 => broadcastable(dims, &[batch, q_len, k_len]),
        2 => broadcastable(dims, &[q_len, k_len]),
        _ => false,
    };
    if !ok {
        return Err(AttentionError::shape(
            format!(
                "mask must be [batch, q_len, k_len] or broadcastable to [{batch}, {heads}, {q_len}, {k_len}]"
            ),
            vec![
                TensorShape::new("mask", dims),
                TensorShape::new("target", &target.dims()),
            ],
        ));
    }

    let mask = match MaskKind::of(mask) {
        MaskKind::Boolean => mask.clone(),
        MaskKind::Additive => mask.to_dtype(compute_dtype)?,
    };

    let mask = match mask.rank() {
        3 => mask.unsqueeze(1)?.repeat((1, heads, 1, 1))?,
        2 => mask.unsqueeze(0)?.unsqueeze(0)?,
        _ => mask,
    };
    Ok(mask)
}

/// Convert a mask into an additive `f32` bias with the given shape.
///
/// Boolean masks map allowed positions to `0.0` and the rest to `-inf`.
pub fn additive_bias(mask: &Tensor, shape: &[usize]) -> Result<Tensor> {
    match MaskKind::of(mask) {
        MaskKind::Boolean => {
            let device = mask.device();
            let keep = Tensor::zeros(shape, DType::F32, device)?;
            let drop = Tensor::full(f32::NEG_INFINITY, shape, device)?;
            let cond = mask.broadcast_as(shape)?.contiguous()?;
            Ok(cond.where_cond(&keep, &drop)?)
        }
        MaskKind::Additive => Ok(mask.to_dtype(DType::F32)?.broadcast_as(shape)?),
    }
}

/// Boolean causal mask of shape `[q_len, k_len]`.
///
/// Query `i` may attend to keys `j <= i` (top-left aligned).
pub fn causal_mask(q_len: usize, k_len: usize, device: &Device) -> Result<Tensor> {
    let mut data = vec![0u8; q_len * k_len];
    for i in 0..q_len {
        let row = i * k_len;
        for j in 0..k_len.min(i + 1) {
            data[row + j] = 1;
        }
    }
    Ok(Tensor::from_vec(data, (q_len, k_len), device)?)
}

/// Boolean mask of shape `[batch, q_len, k_len]` hiding keys past each valid length.
pub fn key_padding_mask(
    key_lengths: &[usize],
    q_len: usize,
    k_len: usize,
    device: &Device,
) -> Result<Tensor> {
    let batch = key_lengths.len();
    let mut data = vec![0u8; batch * q_len * k_len];
    for (b, &valid) in key_lengths.iter().enumerate() {
        let valid = valid.min(k_len);
        for q in 0..q_len {
            let row = (b * q_len + q) * k_len;
            data[row..row + valid].fill(1);
        }
    }
    Ok(Tensor::from_vec(data, (batch, q_len, k_len), device)?)
}
