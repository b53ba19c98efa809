//! Error types for vidattn core.

use std::fmt;

use thiserror::Error;

use crate::attention::AttentionBackendKind;

/// Result type alias for attention operations.
pub type Result<T> = std::result::Result<T, AttentionError>;

/// Name and dimensions of a tensor involved in a shape error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape {
    /// Role of the tensor (`query`, `key`, `value`, `mask`, `output`).
    pub name: &'static str,
    /// Observed dimensions.
    pub dims: Vec<usize>,
}

impl TensorShape {
    /// Capture the shape of a named tensor.
    pub fn new(name: &'static str, dims: &[usize]) -> Self {
        Self {
            name,
            dims: dims.to_vec(),
        }
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.name, self.dims)
    }
}

fn describe(tensors: &[TensorShape]) -> String {
    tensors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur while selecting or running an attention backend.
#[derive(Error, Debug)]
pub enum AttentionError {
    /// Backend identifier not recognized.
    #[error("unsupported attention backend: {identifier:?}")]
    UnsupportedBackend {
        /// The identifier as supplied by the caller.
        identifier: String,
    },

    /// Tensor ranks or sizes violate the attention contract.
    #[error("shape mismatch: {reason} ({})", describe(.tensors))]
    ShapeMismatch {
        /// Which constraint was violated.
        reason: String,
        /// The offending tensors.
        tensors: Vec<TensorShape>,
    },

    /// The backend cannot run in this process.
    #[error("{backend} attention unavailable: {reason}")]
    BackendUnavailable {
        /// Backend that was requested.
        backend: AttentionBackendKind,
        /// Why it cannot run.
        reason: String,
    },

    /// The backend does not accept an explicit attention mask.
    #[error("{backend} attention does not support explicit masks")]
    UnsupportedMask {
        /// Backend that rejected the mask.
        backend: AttentionBackendKind,
    },

    /// Dropout probability outside `[0, 1)`.
    #[error("dropout rate must be in [0, 1), got {0}")]
    InvalidDropout(f32),

    /// I/O error while loading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Error from the distributed primitive, passed through unchanged.
    #[error(transparent)]
    Collective(#[from] vidattn_collective::CollectiveError),

    /// Error from the numeric kernel, passed through unchanged.
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

impl AttentionError {
    pub(crate) fn shape(reason: impl Into<String>, tensors: Vec<TensorShape>) -> Self {
        Self::ShapeMismatch {
            reason: reason.into(),
            tensors,
        }
    }
}
