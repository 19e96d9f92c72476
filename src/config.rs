//! Configuration loader for the `factory-telemetry` service.
//!
//! All runtime configuration values and their defaults are loaded here from
//! environment variables (with optional `.env` file support provided by the
//! caller), so the rest of the crate never calls `env::var` directly.
//!
use std::{env, net::SocketAddr};

use anyhow::{anyhow, Result};

use crate::pipeline::PipelineOptions;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean environment variable with a default value.
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name).ok() {
            Some(v) => parse_bool(&v).ok_or_else(|| anyhow!("Invalid {}: {:?}", $var_name, v))?,
            None => $default,
        }
    };
}

/// Strongly typed application configuration.
///
/// Immutable after loading; every request sees the same snapshot.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Upstream fixture source for `/api/telemetry/fixture`, if any.
    pub sensor_api_url: Option<String>,

    /// Maximum number of upstream pages to fetch (safety limit).
    pub api_max_pages: u32,

    /// Keep unrecognized sensor keys instead of dropping them.
    pub keep_unrecognized: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            sensor_api_url: None,
            api_max_pages: 100,
            keep_unrecognized: false,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `SENSOR_API_URL` – upstream fixture source (default: none)
/// - `API_MAX_PAGES` – max upstream pages to fetch (default: 100)
/// - `KEEP_UNRECOGNIZED_SENSORS` – keep unknown sensor keys (default: false)
///
/// Returns an error if any variable is set but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();

    let bind_addr = match env::var("BIND_ADDR") {
        Ok(v) => v
            .parse::<SocketAddr>()
            .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?,
        Err(_) => defaults.bind_addr,
    };
    let sensor_api_url = env::var("SENSOR_API_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let api_max_pages = parse_env_u32!("API_MAX_PAGES", defaults.api_max_pages);
    let keep_unrecognized = parse_env_bool!("KEEP_UNRECOGNIZED_SENSORS", defaults.keep_unrecognized);

    Ok(Config {
        bind_addr,
        sensor_api_url,
        api_max_pages,
        keep_unrecognized,
    })
}

/// Accepts the usual spellings: `1|true|yes|on` and `0|false|no|off`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    // ---
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Options handed to every pipeline run.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            keep_unrecognized: self.keep_unrecognized,
        }
    }

    /// Log the loaded configuration.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  BIND_ADDR                 : {}", self.bind_addr);
        tracing::info!(
            "  SENSOR_API_URL            : {}",
            self.sensor_api_url.as_deref().unwrap_or("(not set)")
        );
        tracing::info!("  API_MAX_PAGES             : {}", self.api_max_pages);
        tracing::info!("  KEEP_UNRECOGNIZED_SENSORS : {}", self.keep_unrecognized);
    }
}
