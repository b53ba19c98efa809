//! Attention layer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attention::{AttentionBackendKind, AttentionOptions};
use crate::error::Result;

/// Environment variable that overrides the configured backend.
pub const BACKEND_ENV: &str = "VIDATTN_ATTN_BACKEND";

/// Configuration for one attention layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// Backend the layer binds to.
    #[serde(default)]
    pub backend: AttentionBackendKind,
    /// Apply causal masking on every call.
    #[serde(default)]
    pub causal: bool,
    /// Dropout probability, applied only in training mode.
    #[serde(default)]
    pub dropout_rate: f32,
}

impl AttentionConfig {
    /// Create a config for the given backend.
    pub fn new(backend: AttentionBackendKind) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Set causal masking.
    pub fn with_causal(mut self, causal: bool) -> Self {
        self.causal = causal;
        self
    }

    /// Set dropout probability.
    pub fn with_dropout(mut self, rate: f32) -> Self {
        self.dropout_rate = rate;
        self
    }

    /// Per-call options derived from this config.
    pub fn options(&self, training: bool) -> AttentionOptions {
        AttentionOptions::new()
            .with_causal(self.causal)
            .with_dropout(if training { self.dropout_rate } else { 0.0 })
    }

    /// Check the dropout range.
    pub fn validate(&self) -> Result<()> {
        self.options(true).validate()
    }

    /// Load from JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply [`BACKEND_ENV`] if it is set.
    ///
    /// An unrecognized value is an error rather than silently ignored.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(BACKEND_ENV) {
            self.apply_backend_override(&value)?;
        }
        Ok(())
    }

    fn apply_backend_override(&mut self, value: &str) -> Result<()> {
        let backend = value.trim().parse::<AttentionBackendKind>()?;
        if backend != self.backend {
            tracing::info!(from = %self.backend, to = %backend, "attention backend overridden");
        }
        self.backend = backend;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttentionError;

    #[test]
    fn defaults() {
        let config = AttentionConfig::default();
        assert_eq!(config.backend, AttentionBackendKind::LocalDense);
        assert!(!config.causal);
        assert_eq!(config.dropout_rate, 0.0);
    }

    #[test]
    fn json_with_missing_fields() {
        let config: AttentionConfig = serde_json::from_str(r#"{"backend": "parallel"}"#).unwrap();
        assert_eq!(
            config,
            AttentionConfig::new(AttentionBackendKind::SequenceParallel)
        );
    }

    #[test]
    fn json_round_trip() {
        let config = AttentionConfig::new(AttentionBackendKind::SequenceParallel)
            .with_causal(true)
            .with_dropout(0.1);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"sequence-parallel\""));
        let back: AttentionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn unknown_backend_in_json() {
        let err = serde_json::from_str::<AttentionConfig>(r#"{"backend": "flash"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn from_file_reads_and_validates() {
        let dir = std::env::temp_dir().join(format!("vidattn-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.json");
        std::fs::write(&good, r#"{"backend": "local-dense", "causal": true}"#).unwrap();
        let config = AttentionConfig::from_file(&good).unwrap();
        assert!(config.causal);

        let bad = dir.join("bad.json");
        std::fs::write(&bad, r#"{"dropout_rate": 1.5}"#).unwrap();
        assert!(matches!(
            AttentionConfig::from_file(&bad),
            Err(AttentionError::InvalidDropout(_))
        ));

        assert!(matches!(
            AttentionConfig::from_file(&dir.join("missing.json")),
            Err(AttentionError::Io(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn options_drop_dropout_in_eval() {
        let config = AttentionConfig::default().with_causal(true).with_dropout(0.2);
        assert_eq!(config.options(true).dropout_rate, 0.2);
        assert_eq!(config.options(false).dropout_rate, 0.0);
        assert!(config.options(false).causal);
    }

    #[test]
    fn backend_override() {
        let mut config = AttentionConfig::default();
        config.apply_backend_override(" sequence-parallel ").unwrap();
        assert_eq!(config.backend, AttentionBackendKind::SequenceParallel);

        let err = config.apply_backend_override("ring").unwrap_err();
        assert!(matches!(err, AttentionError::UnsupportedBackend { .. }));
        assert_eq!(config.backend, AttentionBackendKind::SequenceParallel);
    }
}
