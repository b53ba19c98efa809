//! # vidattn collective
//!
//! Binding seam for distributed long-context (sequence-parallel) attention.
//!
//! This crate provides:
//! - [`LongContextAttention`] - the opaque collective primitive
//! - [`ProcessGroup`] - group context passed through to the primitive
//! - a process-wide capability probe resolved once per process

#![warn(missing_docs)]

pub mod error;
pub mod group;
mod probe;

use std::fmt;

use candle_core::Tensor;

pub use error::{CollectiveError, Result};
pub use group::ProcessGroup;
pub use probe::{
    long_context_attention, register_long_context_attention, sequence_parallel_available,
};

/// Distributed attention over a sequence axis sharded across processes.
///
/// Inputs are the local shards with layout `[batch, seq_shard, heads, head_dim]`;
/// the primitive owns any internal re-layout and all communication. The call
/// blocks until every process in the group reaches it. There is no timeout.
pub trait LongContextAttention: Send + Sync + fmt::Debug {
    /// Compute attention for the local shard.
    ///
    /// `group` is `None` when the primitive should use its own default group.
    /// The returned tensor has the shape of the local `query` shard.
    fn attend(
        &self,
        group: Option<&ProcessGroup>,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        causal: bool,
    ) -> Result<Tensor>;

    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        "long-context"
    }
}
