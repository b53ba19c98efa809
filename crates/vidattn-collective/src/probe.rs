//! Process-wide capability probe for the long-context primitive.
//!
//! The primitive is resolved at most once per process. A binary that links
//! a collective implementation registers it during startup; the first call
//! to [`long_context_attention`] freezes the answer and every later lookup
//! sees the same cached value.

use std::sync::{Arc, OnceLock};

use crate::error::{CollectiveError, Result};
use crate::LongContextAttention;

static PRIMITIVE: OnceLock<Option<Arc<dyn LongContextAttention>>> = OnceLock::new();

/// Install the long-context primitive for this process.
///
/// Must happen before the first lookup. Fails with
/// [`CollectiveError::AlreadyResolved`] if the probe already ran, whether
/// it found a primitive or not.
pub fn register_long_context_attention(primitive: Arc<dyn LongContextAttention>) -> Result<()> {
    let name = primitive.name().to_string();
    PRIMITIVE
        .set(Some(primitive))
        .map_err(|_| CollectiveError::AlreadyResolved)?;
    tracing::info!(primitive = %name, "registered long-context attention");
    Ok(())
}

/// Resolve the long-context primitive, caching the result for the process.
pub fn long_context_attention() -> Option<Arc<dyn LongContextAttention>> {
    PRIMITIVE
        .get_or_init(|| {
            tracing::info!("no long-context attention registered; sequence-parallel disabled");
            None
        })
        .clone()
}

/// Whether sequence-parallel attention can run in this process.
pub fn sequence_parallel_available() -> bool {
    long_context_attention().is_some()
}
