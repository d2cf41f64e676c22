//! Logging setup.

use anyhow::Result;
use tracing_subscriber::{filter::EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Install the global subscriber: stderr output, `RUST_LOG` takes precedence
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .try_init()?;

    tracing::debug!("logging initialized at {}", default_level);
    Ok(())
}
