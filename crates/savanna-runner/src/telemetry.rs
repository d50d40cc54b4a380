//! Logging setup for the runner.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,savanna_world=debug";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()?;
    }

    info!(json, "Telemetry initialized");
    Ok(())
}
