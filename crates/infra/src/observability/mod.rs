//! Tracing bootstrap
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init_tracing`] once; later calls are no-ops.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_FILTER: &str = "info";

/// Output format for [`init_tracing`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    if installed {
        tracing::debug!(?format, "tracing subscriber installed");
    }
    installed
}
