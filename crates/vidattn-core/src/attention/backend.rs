//! Attention backend identifier, call options and strategy trait.
//!
//! This module provides:
//! - [`AttentionBackendKind`] - Closed set of backends a layer can bind to
//! - [`AttentionOptions`] - Per-call causal flag and dropout rate
//! - [`AttentionStrategy`] - Trait implemented by every backend

use std::fmt;
use std::str::FromStr;

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::{AttentionError, Result};

/// Backend an attention layer is bound to.
///
/// Chosen once per layer instantiation and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttentionBackendKind {
    /// Single-device attention through a fused scaled-dot-product kernel.
    #[default]
    #[serde(alias = "torch")]
    LocalDense,
    /// Distributed attention with the sequence axis sharded across processes.
    #[serde(alias = "parallel")]
    SequenceParallel,
}

impl AttentionBackendKind {
    /// Every backend, in declaration order.
    pub const ALL: [AttentionBackendKind; 2] = [Self::LocalDense, Self::SequenceParallel];

    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalDense => "local-dense",
            Self::SequenceParallel => "sequence-parallel",
        }
    }

    /// Whether the backend accepts an explicit attention mask.
    pub fn supports_mask(&self) -> bool {
        match self {
            Self::LocalDense => true,
            Self::SequenceParallel => false,
        }
    }
}

impl fmt::Display for AttentionBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttentionBackendKind {
    type Err = AttentionError;

    fn from_str(identifier: &str) -> Result<Self> {
        match identifier {
            "local-dense" | "torch" => Ok(Self::LocalDense),
            "sequence-parallel" | "parallel" => Ok(Self::SequenceParallel),
            other => Err(AttentionError::UnsupportedBackend {
                identifier: other.to_string(),
            }),
        }
    }
}

/// Scalar parameters passed with every attention call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttentionOptions {
    /// Restrict each query position to keys at or before its own index.
    pub causal: bool,
    /// Dropout probability applied to attention weights, in `[0, 1)`.
    pub dropout_rate: f32,
}

impl AttentionOptions {
    /// Full (non-causal) attention without dropout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable causal masking.
    pub fn with_causal(mut self, causal: bool) -> Self {
        self.causal = causal;
        self
    }

    /// Set the dropout probability.
    pub fn with_dropout(mut self, rate: f32) -> Self {
        self.dropout_rate = rate;
        self
    }

    /// Check that the dropout rate lies in `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(AttentionError::InvalidDropout(self.dropout_rate));
        }
        Ok(())
    }
}

/// Attention computation over tensors laid out `[batch, seq_len, heads, head_dim]`.
///
/// * `key` and `value` share their sequence length, which may differ from
///   the query's.
/// * The output has exactly the shape of `query`.
/// * `mask` is boolean (`U8`, non-zero = attend) or an additive bias, shaped
///   `[batch, q_len, k_len]` or broadcastable to `[batch, heads, q_len, k_len]`.
///
/// Implementations hold no per-call state and may be shared across threads.
pub trait AttentionStrategy: Send + Sync {
    /// Backend this strategy implements.
    fn kind(&self) -> AttentionBackendKind;

    /// Compute attention for one forward pass.
    fn attend(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
        options: &AttentionOptions,
    ) -> Result<Tensor>;
}
