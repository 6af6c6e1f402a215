//! Tracing bootstrap for the bookshelf binaries.

use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FALLBACK_FILTER: &str = "info";

/// `RUST_LOG` wins over the configured level; an unparsable level falls back to `info`.
pub fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(settings));

    let installed = match settings.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if installed.is_err() {
        tracing::debug!(target: "bookshelf-telemetry", "subscriber already installed");
        return Ok(());
    }

    tracing::info!(
        target: "bookshelf-telemetry",
        format = ?settings.log_format,
        level = %settings.log_level,
        "telemetry initialized"
    );
    Ok(())
}
