//! Backend selection.
//!
//! A layer picks its backend once, at construction, and keeps the returned
//! [`AttentionProcessor`] for its whole lifetime. Unknown identifiers fail
//! here, never in the middle of a forward pass.

use candle_core::Tensor;

use super::backend::{AttentionBackendKind, AttentionOptions, AttentionStrategy};
use super::dense::DenseAttention;
use super::parallel::SequenceParallelAttention;
use crate::error::Result;

/// Attention strategy bound to one backend.
#[derive(Debug, Clone)]
pub enum AttentionProcessor {
    /// Single-device dense attention.
    Dense(DenseAttention),
    /// Distributed sequence-parallel attention.
    SequenceParallel(SequenceParallelAttention),
}

impl AttentionProcessor {
    fn strategy(&self) -> &dyn AttentionStrategy {
        match self {
            Self::Dense(dense) => dense,
            Self::SequenceParallel(parallel) => parallel,
        }
    }
}

impl AttentionStrategy for AttentionProcessor {
    fn kind(&self) -> AttentionBackendKind {
        self.strategy().kind()
    }

    fn attend(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
        options: &AttentionOptions,
    ) -> Result<Tensor> {
        self.strategy().attend(query, key, value, mask, options)
    }
}

/// Return the strategy for a backend.
///
/// Selecting the sequence-parallel backend consults the process-wide probe
/// but never fails; a missing primitive surfaces on the first call.
pub fn select(kind: AttentionBackendKind) -> AttentionProcessor {
    let processor = match kind {
        AttentionBackendKind::LocalDense => AttentionProcessor::Dense(DenseAttention::new()),
        AttentionBackendKind::SequenceParallel => {
            AttentionProcessor::SequenceParallel(SequenceParallelAttention::from_process())
        }
    };
    tracing::debug!(backend = %kind, "selected attention backend");
    processor
}

/// Parse a backend identifier and return its strategy.
///
/// Unrecognized identifiers fail with
/// [`AttentionError::UnsupportedBackend`](crate::error::AttentionError::UnsupportedBackend)
/// before any tensor is touched.
pub fn select_by_name(identifier: &str) -> Result<AttentionProcessor> {
    let kind = identifier.parse::<AttentionBackendKind>()?;
    Ok(select(kind))
}
