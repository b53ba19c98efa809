//! # vidattn
//!
//! Attention for video diffusion transformers, on one device or sharded
//! across many.
//!
//! vidattn lets a transformer block pick its attention backend once and
//! then call it every forward pass without caring where it runs:
//! - **Local dense**: fused scaled-dot-product attention on the current device
//! - **Sequence parallel**: long-context attention with the sequence axis
//!   sharded across cooperating processes
//!
//! Both backends take `[batch, seq_len, heads, head_dim]` tensors and return
//! the query's shape.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vidattn::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let layer = AttentionLayer::builder()
//!         .backend_name("local-dense")
//!         .causal(false)
//!         .env_overrides(true)
//!         .build()?;
//!
//!     let out = layer.forward(&q, &k, &v, Some(&mask))?;
//!     assert_eq!(out.dims(), q.dims());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Re-export core crate
pub use vidattn_core::*;

// Re-export collective crate (for processes that register a primitive)
pub use vidattn_collective as collective;

mod layer;

pub use layer::{AttentionLayer, AttentionLayerBuilder};

/// Commonly used types.
pub mod prelude {
    pub use crate::layer::{AttentionLayer, AttentionLayerBuilder};
    pub use crate::{
        attention::{
            select, select_by_name, AttentionBackendKind, AttentionOptions, AttentionProcessor,
            AttentionStrategy, DenseAttention, SequenceParallelAttention,
        },
        config::AttentionConfig,
        error::{AttentionError, Result},
    };
    pub use vidattn_collective::{LongContextAttention, ProcessGroup};

    // Re-export useful external types
    pub use candle_core::{DType, Device, Tensor};
    pub use tracing;
}
