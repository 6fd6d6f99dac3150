//! Process-wide log setup.
//!
//! `log` records from infrastructure code and `tracing` events from the job
//! pipeline end up in the same subscriber. `RUST_LOG` overrides the level.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::MossrunError;

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(debug: bool, json: bool) -> Result<(), MossrunError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_log::LogTracer::init().map_err(|e| MossrunError::Logging(e.to_string()))?;

    let registry = Registry::default().with(filter);
    let installed = if json {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
    } else {
        tracing::subscriber::set_global_default(registry.with(fmt::layer()))
    };
    installed.map_err(|e| MossrunError::Logging(e.to_string()))
}
