//! Shape preconditions shared by every backend.

use candle_core::Tensor;

use crate::error::{AttentionError, Result, TensorShape};

/// Sizes of a validated `[batch, seq_len, heads, head_dim]` q/k/v triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QkvDims {
    /// Batch size.
    pub batch: usize,
    /// Query sequence length.
    pub q_len: usize,
    /// Key/value sequence length.
    pub k_len: usize,
    /// Number of heads.
    pub heads: usize,
    /// Size of each head.
    pub head_dim: usize,
}

fn rank4(name: &'static str, tensor: &Tensor) -> Result<(usize, usize, usize, usize)> {
    tensor.dims4().map_err(|_| {
        AttentionError::shape(
            format!("{name} must have shape [batch, seq_len, heads, head_dim]"),
            vec![TensorShape::new(name, tensor.dims())],
        )
    })
}

fn mismatch(axis: &str, lhs: (&'static str, &Tensor), rhs: (&'static str, &Tensor)) -> AttentionError {
    AttentionError::shape(
        format!("{axis} differs between {} and {}", lhs.0, rhs.0),
        vec![
            TensorShape::new(lhs.0, lhs.1.dims()),
            TensorShape::new(rhs.0, rhs.1.dims()),
        ],
    )
}

/// Validate a token-major q/k/v triple.
///
/// Batch, head count and head dimension must agree across all three;
/// key and value must share a sequence length. Nothing is broadcast.
pub fn check_qkv(query: &Tensor, key: &Tensor, value: &Tensor) -> Result<QkvDims> {
    let (qb, q_len, qh, qd) = rank4("query", query)?;
    let (kb, k_len, kh, kd) = rank4("key", key)?;
    let (vb, v_len, vh, vd) = rank4("value", value)?;

    let q = ("query", query);
    let k = ("key", key);
    let v = ("value", value);

    if kb != qb {
        return Err(mismatch("batch size", q, k));
    }
    if kh != qh {
        return Err(mismatch("head count", q, k));
    }
    if kd != qd {
        return Err(mismatch("head dimension", q, k));
    }
    if vb != kb {
        return Err(mismatch("batch size", k, v));
    }
    if v_len != k_len {
        return Err(mismatch("sequence length", k, v));
    }
    if vh != kh {
        return Err(mismatch("head count", k, v));
    }
    if vd != kd {
        return Err(mismatch("head dimension", k, v));
    }

    Ok(QkvDims {
        batch: qb,
        q_len,
        k_len,
        heads: qh,
        head_dim: qd,
    })
}
