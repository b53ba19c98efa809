//! Backend selection example.
//!
//! Builds one attention layer per backend identifier given on the command
//! line (default: both) and runs a causal forward pass on random latents.
//! Set `VIDATTN_ATTN_BACKEND` to force a backend for every layer.

use anyhow::Result;
use vidattn::prelude::*;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let identifiers: Vec<String> = match std::env::args().skip(1).collect::<Vec<_>>() {
        args if args.is_empty() => AttentionBackendKind::ALL
            .iter()
            .map(|kind| kind.as_str().to_string())
            .collect(),
        args => args,
    };

    println!(
        "sequence-parallel primitive available: {}",
        vidattn::collective::sequence_parallel_available()
    );

    // [batch, frames * patches, heads, head_dim]
    let device = Device::Cpu;
    let q = Tensor::randn(0.0f32, 1.0, (1, 64, 8, 32), &device)?;
    let k = Tensor::randn(0.0f32, 1.0, (1, 64, 8, 32), &device)?;
    let v = Tensor::randn(0.0f32, 1.0, (1, 64, 8, 32), &device)?;

    for identifier in identifiers {
        let layer = match AttentionLayer::builder()
            .backend_name(identifier.as_str())
            .causal(true)
            .env_overrides(true)
            .build()
        {
            Ok(layer) => layer,
            Err(err) => {
                println!("{identifier}: {err}");
                continue;
            }
        };

        match layer.forward(&q, &k, &v, None) {
            Ok(out) => println!("{identifier}: {} -> {:?}", layer.backend(), out.dims()),
            Err(AttentionError::BackendUnavailable { reason, .. }) => {
                println!("{identifier}: unavailable ({reason}); use local-dense instead")
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
