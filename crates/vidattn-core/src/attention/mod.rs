//! Attention computation backends.
//!
//! Provides abstractions over the two interchangeable implementations:
//! - [`DenseAttention`] - Single-device attention through a fused SDPA kernel
//! - [`SequenceParallelAttention`] - Distributed long-context attention
//!
//! [`select`] and [`select_by_name`] map a backend identifier to an
//! [`AttentionProcessor`]. All backends take token-major tensors
//! `[batch, seq_len, heads, head_dim]` and return the query's shape.

mod backend;
mod dense;
pub mod kernel;
pub mod mask;
mod parallel;
mod selector;
mod shape;

pub use backend::{AttentionBackendKind, AttentionOptions, AttentionStrategy};
pub use dense::DenseAttention;
pub use kernel::{CandleSdpa, ScaledDotProductKernel};
pub use mask::MaskKind;
pub use parallel::SequenceParallelAttention;
pub use selector::{select, select_by_name, AttentionProcessor};
pub use shape::{check_qkv, QkvDims};
