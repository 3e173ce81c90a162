//! Tracing subscriber bootstrap.
//!
//! Log output goes to stderr so command output on stdout stays machine
//! readable.

use anyhow::anyhow;
use libris_kernel::settings::{LogFormat, TelemetrySettings};
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber described by `settings`.
///
/// `RUST_LOG` overrides `settings.log_level`. Calling this more than once is
/// a no-op.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    INSTALLED
        .get_or_try_init(|| {
            let filter = build_filter(settings)?;

            let installed = match settings.log_format {
                LogFormat::Pretty => tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .try_init(),
                LogFormat::Json => tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .try_init(),
            };
            installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

            tracing::info!(
                target: "libris-telemetry",
                format = ?settings.log_format,
                level = %settings.log_level,
                "telemetry initialized"
            );
            Ok(())
        })
        .map(|_| ())
}

fn build_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.log_level)
            .map_err(|e| anyhow!("invalid log level '{}': {e}", settings.log_level)),
    }
}
