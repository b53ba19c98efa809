//! # vidattn core
//!
//! Attention strategies for video diffusion transformers.
//!
//! This crate provides:
//! - **Backend selection** from a closed set of identifiers, failing fast on
//!   unknown names
//! - **Dense attention** through a fused scaled-dot-product kernel, with mask
//!   normalization and layout conversion
//! - **Sequence-parallel attention** delegated to a distributed long-context
//!   primitive
//! - **Configuration** loadable from JSON with environment overrides
//!
//! Both backends take `[batch, seq_len, heads, head_dim]` tensors and return
//! the query's shape, so a model produces shape-compatible outputs whichever
//! backend it runs on.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod attention;
pub mod config;
pub mod error;

pub use error::{AttentionError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::attention::{
        select, select_by_name, AttentionBackendKind, AttentionOptions, AttentionProcessor,
        AttentionStrategy, DenseAttention, SequenceParallelAttention,
    };
    pub use crate::config::AttentionConfig;
    pub use crate::error::{AttentionError, Result};
}
