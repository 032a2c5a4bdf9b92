//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `CHAINSCAN_API_KEY` is missing or a value is invalid, falls back to
//!    loading from file
//! 3. Searches multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CHAINSCAN_API_KEY`: API key (required)
//! - `CHAINSCAN_BASE_URL`: Endpoint URL
//! - `CHAINSCAN_CHAIN_ID`: Network injected when a call names none
//! - `CHAINSCAN_OVERFLOW`: `block`, `raise` or `skip`
//! - `CHAINSCAN_RATE_LIMITS`: Windows as `capacity/period_ms`, comma separated
//! - `CHAINSCAN_TIMEOUT_SECS`: Per-request timeout in seconds
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./chainscan.toml`, `./chainscan.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent directory
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use chainscan_domain::{ChainScanError, ClientConfig, OverflowBehavior, Result, WindowConfig};

/// API key
pub const ENV_API_KEY: &str = "CHAINSCAN_API_KEY";
/// Endpoint base URL
pub const ENV_BASE_URL: &str = "CHAINSCAN_BASE_URL";
/// Default `chainid`
pub const ENV_CHAIN_ID: &str = "CHAINSCAN_CHAIN_ID";
/// Default overflow behavior (`block`, `skip`, `raise`)
pub const ENV_OVERFLOW: &str = "CHAINSCAN_OVERFLOW";
/// Window list such as `5/1000,100000/86400000`
pub const ENV_RATE_LIMITS: &str = "CHAINSCAN_RATE_LIMITS";
/// Per-request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "CHAINSCAN_TIMEOUT_SECS";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["chainscan.toml", "chainscan.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ChainScanError::Config` if neither source yields a valid
/// configuration.
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `CHAINSCAN_API_KEY` is required; unset variables keep their
/// defaults.
///
/// # Errors
/// Returns `ChainScanError::Config` if the key is missing or a value does
/// not parse.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_var(ENV_API_KEY)?);

    if let Some(base_url) = env_opt(ENV_BASE_URL) {
        config.base_url = base_url;
    }
    if let Some(chain_id) = env_opt(ENV_CHAIN_ID) {
        config.default_chain_id = chain_id;
    }
    if let Some(overflow) = env_opt(ENV_OVERFLOW) {
        config.default_overflow = Some(overflow.parse::<OverflowBehavior>()?);
    }
    if let Some(limits) = env_opt(ENV_RATE_LIMITS) {
        config.rate_limits = WindowConfig::parse_list(&limits)?;
    }
    if let Some(timeout) = env_opt(ENV_TIMEOUT_SECS) {
        config.timeout_secs = timeout
            .parse::<u64>()
            .map_err(|e| ChainScanError::Config(format!("Invalid timeout: {}", e)))?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ChainScanError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or validation fails
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ChainScanError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => search_config_paths().ok_or_else(|| {
            ChainScanError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ChainScanError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ChainScanError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ChainScanError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ChainScanError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Search the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn search_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    search_in(&dirs)
}

fn search_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        ChainScanError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Set and non-blank environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
