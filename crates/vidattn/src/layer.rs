//! Attention layer bound to one backend for its lifetime.

use candle_core::Tensor;
use vidattn_core::attention::{
    select, AttentionBackendKind, AttentionOptions, AttentionProcessor, AttentionStrategy,
};
use vidattn_core::config::AttentionConfig;
use vidattn_core::error::Result;

/// Builder for creating an [`AttentionLayer`].
#[derive(Debug, Clone, Default)]
pub struct AttentionLayerBuilder {
    config: AttentionConfig,
    backend_name: Option<String>,
    env_overrides: bool,
    processor: Option<AttentionProcessor>,
}

impl AttentionLayerBuilder {
    /// Create a new layer builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: AttentionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set backend.
    pub fn backend(mut self, backend: AttentionBackendKind) -> Self {
        self.config.backend = backend;
        self.backend_name = None;
        self
    }

    /// Set backend by identifier; parsed in [`build`](Self::build).
    pub fn backend_name(mut self, identifier: impl Into<String>) -> Self {
        self.backend_name = Some(identifier.into());
        self
    }

    /// Set causal masking.
    pub fn causal(mut self, causal: bool) -> Self {
        self.config.causal = causal;
        self
    }

    /// Set training-mode dropout.
    pub fn dropout(mut self, rate: f32) -> Self {
        self.config.dropout_rate = rate;
        self
    }

    /// Honour the backend environment override.
    pub fn env_overrides(mut self, enabled: bool) -> Self {
        self.env_overrides = enabled;
        self
    }

    /// Use an explicitly constructed strategy instead of selecting one.
    ///
    /// The configured backend is replaced by the strategy's own kind.
    pub fn processor(mut self, processor: AttentionProcessor) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Build the layer.
    pub fn build(self) -> Result<AttentionLayer> {
        let mut config = self.config;
        if let Some(identifier) = self.backend_name {
            config.backend = identifier.parse()?;
        }
        if self.env_overrides {
            config.apply_env_overrides()?;
        }
        config.validate()?;

        let processor = match self.processor {
            Some(processor) => {
                config.backend = processor.kind();
                processor
            }
            None => select(config.backend),
        };

        tracing::debug!(
            backend = %config.backend,
            causal = config.causal,
            dropout_rate = config.dropout_rate,
            "built attention layer"
        );

        Ok(AttentionLayer {
            config,
            processor,
            training: false,
        })
    }
}

/// One attention sub-layer of a transformer block.
///
/// Selects its backend once at construction and reuses it for every
/// forward pass. Starts in evaluation mode, where dropout is disabled.
///
/// # Example
///
/// ```rust,ignore
/// use vidattn::prelude::*;
///
/// let layer = AttentionLayer::builder()
///     .backend_name("local-dense")
///     .causal(true)
///     .build()?;
/// let out = layer.forward(&q, &k, &v, None)?;
/// ```
#[derive(Debug, Clone)]
pub struct AttentionLayer {
    config: AttentionConfig,
    processor: AttentionProcessor,
    training: bool,
}

impl AttentionLayer {
    /// Create a builder.
    pub fn builder() -> AttentionLayerBuilder {
        AttentionLayerBuilder::new()
    }

    /// Create a layer from a configuration.
    pub fn new(config: AttentionConfig) -> Result<Self> {
        AttentionLayerBuilder::new().config(config).build()
    }

    /// Layer configuration.
    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    /// Backend the layer is bound to.
    pub fn backend(&self) -> AttentionBackendKind {
        self.processor.kind()
    }

    /// Switch to training mode; dropout becomes active.
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Switch to evaluation mode; dropout is disabled.
    pub fn eval(&mut self) {
        self.training = false;
    }

    /// Whether the layer is in training mode.
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Options the next forward pass will use.
    pub fn options(&self) -> AttentionOptions {
        self.config.options(self.training)
    }

    /// Run attention on `[batch, seq_len, heads, head_dim]` tensors.
    pub fn forward(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        self.processor
            .attend(query, key, value, mask, &self.options())
    }
}
