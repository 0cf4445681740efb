//! Tracing subscriber initialisation
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the embedding application, which can call [`init_tracing`] once at
//! startup. The filter comes from `RUST_LOG` and defaults to `info`.

use std::str::FromStr;

use courier_domain::{impl_domain_enum_conversions, CourierError, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl_domain_enum_conversions!(LogFormat {
    Text => "text",
    Json => "json",
});

/// Install the global tracing subscriber
///
/// Returns `Ok(false)` when a subscriber was already installed, so repeated
/// calls are harmless.
///
/// # Errors
/// Returns `CourierError::Config` if `RUST_LOG` holds an invalid directive.
pub fn init_tracing(format: LogFormat) -> Result<bool> {
    let filter = env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true).compact()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_current_span(true)).try_init(),
    };

    Ok(installed.is_ok())
}

/// Same as [`init_tracing`] with the format read from `COURIER_LOG_FORMAT`
///
/// # Errors
/// Returns `CourierError::Config` for an unknown format or filter.
pub fn init_tracing_from_env() -> Result<bool> {
    let format = match std::env::var("COURIER_LOG_FORMAT") {
        Ok(raw) => LogFormat::from_str(raw.trim()).map_err(CourierError::Config)?,
        Err(_) => LogFormat::default(),
    };
    init_tracing(format)
}

fn env_filter() -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| CourierError::Config(format!("Failed to create log filter: {e}"))),
        _ => Ok(EnvFilter::new(DEFAULT_FILTER)),
    }
}
