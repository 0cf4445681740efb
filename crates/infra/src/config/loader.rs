//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `COURIER_ENDPOINT` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `COURIER_ENDPOINT`: Service endpoint URL (required)
//! - `COURIER_REGION`: Region name
//! - `COURIER_ACCOUNT`: Account identifier
//! - `COURIER_HTTP_TIMEOUT_SECS`: HTTP timeout in seconds
//! - `COURIER_MAX_ATTEMPTS`: Attempts per operation
//! - `COURIER_COOLDOWN_SECS`: Wait after a recently-deleted refusal
//! - `COURIER_TRANSPORT_RETRY`: Whether transport failures are retried
//!   (true/false)
//! - `COURIER_DIGEST`: Body digest algorithm (`sha256` or `blake3`)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./courier.json` or `./courier.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use courier_domain::{ClientConfig, CourierError, DigestAlgorithm, Result};

use crate::errors::InfraError;

const FILE_NAMES: [&str; 4] = ["courier.json", "courier.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the endpoint is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `CourierError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `COURIER_ENDPOINT` is required; every other value falls back to its
/// default.
///
/// # Errors
/// Returns `CourierError::Config` if the endpoint is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let defaults = ClientConfig::default();
    let mut config = ClientConfig { endpoint: env_var("COURIER_ENDPOINT")?, ..defaults };

    if let Some(region) = env_opt("COURIER_REGION") {
        config.region = region;
    }
    config.account = env_opt("COURIER_ACCOUNT");
    if let Some(timeout) = env_parse::<u64>("COURIER_HTTP_TIMEOUT_SECS", "HTTP timeout")? {
        config.http.timeout_seconds = timeout;
    }
    if let Some(attempts) = env_parse::<u32>("COURIER_MAX_ATTEMPTS", "max attempts")? {
        config.retry.max_attempts = attempts;
    }
    if let Some(cooldown) = env_parse::<u64>("COURIER_COOLDOWN_SECS", "cooldown")? {
        config.retry.cooldown_seconds = cooldown;
    }
    config.retry.transport_retry = env_bool("COURIER_TRANSPORT_RETRY", config.retry.transport_retry);
    if let Some(digest) = env_opt("COURIER_DIGEST") {
        config.digest = DigestAlgorithm::from_str(&digest).map_err(CourierError::Config)?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CourierError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CourierError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CourierError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(InfraError::from)?;
    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`). Missing
/// fields take their defaults.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CourierError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CourierError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches `courier.{json,toml}` then `config.{json,toml}` in the current
/// working directory and up to two parents, then the same relative to the
/// executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    candidate_paths(&roots).into_iter().find(|path| path.exists())
}

fn candidate_paths(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .flat_map(|root| [root.clone(), root.join(".."), root.join("../..")])
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .collect()
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        CourierError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Non-empty environment variable, if set
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| CourierError::Config(format!("Invalid {}: {}", what, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
