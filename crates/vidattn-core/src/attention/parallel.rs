//! Sequence-parallel attention over a sharded sequence axis.

use std::sync::Arc;

use candle_core::Tensor;
use vidattn_collective::{LongContextAttention, ProcessGroup};

use super::backend::{AttentionBackendKind, AttentionOptions, AttentionStrategy};
use super::shape::check_qkv;
use crate::error::{AttentionError, Result, TensorShape};

/// Attention delegated to the distributed long-context primitive.
///
/// Inputs are the local sequence shards in `[batch, seq_shard, heads, head_dim]`
/// layout and are handed over without reshaping. Only full or causal
/// attention is supported; explicit masks are rejected and dropout is not
/// applied.
///
/// Every process in the group must call with shard-consistent shapes. That
/// is not checked here, and a process that never reaches the call blocks
/// all of its peers.
#[derive(Debug, Clone)]
pub struct SequenceParallelAttention {
    primitive: Option<Arc<dyn LongContextAttention>>,
    group: Option<ProcessGroup>,
}

impl SequenceParallelAttention {
    /// Bind to whatever primitive the process-wide probe resolved.
    pub fn from_process() -> Self {
        Self {
            primitive: vidattn_collective::long_context_attention(),
            group: None,
        }
    }

    /// Bind to an explicit primitive.
    pub fn with_primitive(primitive: Arc<dyn LongContextAttention>) -> Self {
        Self {
            primitive: Some(primitive),
            group: None,
        }
    }

    /// A strategy whose primitive is known to be missing.
    pub fn unavailable() -> Self {
        Self {
            primitive: None,
            group: None,
        }
    }

    /// Pass an explicit group context to the primitive.
    pub fn with_group(mut self, group: ProcessGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Whether the primitive was resolved.
    pub fn is_available(&self) -> bool {
        self.primitive.is_some()
    }

    /// Group context handed to the primitive, if any.
    pub fn group(&self) -> Option<&ProcessGroup> {
        self.group.as_ref()
    }
}

impl AttentionStrategy for SequenceParallelAttention {
    fn kind(&self) -> AttentionBackendKind {
        AttentionBackendKind::SequenceParallel
    }

    fn attend(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
        options: &AttentionOptions,
    ) -> Result<Tensor> {
        let primitive = self
            .primitive
            .as_ref()
            .ok_or_else(|| AttentionError::BackendUnavailable {
                backend: AttentionBackendKind::SequenceParallel,
                reason: "sequence-parallel attention requires a registered long-context attention primitive"
                    .to_string(),
            })?;

        if mask.is_some() {
            return Err(AttentionError::UnsupportedMask {
                backend: AttentionBackendKind::SequenceParallel,
            });
        }
        check_qkv(query, key, value)?;

        if options.dropout_rate > 0.0 {
            tracing::trace!(
                dropout_rate = options.dropout_rate,
                "dropout ignored by sequence-parallel attention"
            );
        }
        tracing::trace!(
            primitive = primitive.name(),
            rank = self.group.map(|g| g.rank()),
            causal = options.causal,
            "sequence-parallel attention"
        );

        let output = primitive.attend(self.group.as_ref(), query, key, value, options.causal)?;

        if output.dims() != query.dims() {
            return Err(AttentionError::shape(
                "long-context primitive returned a different shape than the local query shard",
                vec![
                    TensorShape::new("query", query.dims()),
                    TensorShape::new("output", output.dims()),
                ],
            ));
        }
        Ok(output)
    }
}
