//! Bootstrap helpers kept out of `main` proper, mirroring the teacher's
//! `src/main_helpers.rs` split between a thin `main` and a richer
//! bootstrap module.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a `tracing_subscriber` writing to stderr, gated by `RUST_LOG`
/// (default level `info`). Operator-facing diagnostic output, distinct
/// from the conversation-facing `Event` stream (see `SPEC_FULL.md`
/// "Ambient stack / Logging").
pub fn initialize_tracing() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
