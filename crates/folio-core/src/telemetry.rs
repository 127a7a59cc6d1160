//! Logging initialisation.
//!
//! Every crate logs through `tracing`; binaries call [`init_logging`] once at
//! startup to install a `tracing-subscriber` registry.

use crate::{FolioError, FolioResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. `format` selects between
/// human-readable output (`pretty`) and one JSON object per line (`json`).
/// Calling this more than once is harmless: later calls keep the first
/// subscriber.
pub fn init_logging(level: &str, format: &str) -> FolioResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("{},tower_http=info", level))
            .map_err(|e| FolioError::Configuration(format!("Invalid log level '{}': {}", level, e)))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed, keeping it");
    }

    Ok(())
}
