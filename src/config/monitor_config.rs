//! Monitor Configuration - playback timings, cut points and remote endpoints
//!
//! Each section implements `Default` with the built-in values from
//! [`super::defaults`], so a missing file or section changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::types::{CostProfile, Domain, RiskTiers};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "FLEETWATCH_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "fleetwatch.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration of one monitoring deployment.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$FLEETWATCH_CONFIG`
/// 2. `./fleetwatch.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonitorConfig {
    /// Equipment domain served by this instance
    #[serde(default)]
    pub domain: Domain,

    /// Remote scorer endpoint
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Playback clock and buffers
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Cost optimiser debounce and starting costs
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// Fleet refresh and treemap sizing
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Canonical risk tier cut points
    #[serde(default)]
    pub risk_tiers: RiskTiers,

    /// Outbound alert dispatch
    #[serde(default)]
    pub alerts: AlertConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$FLEETWATCH_CONFIG` environment variable
    /// 2. `./fleetwatch.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), domain = %config.domain, "Loaded monitor config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./fleetwatch.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(domain = %config.domain, "Loaded monitor config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No monitor config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Tier cut points satisfy `0 < medium < high <= 100`
    /// - Intervals, strides and capacities are non-zero
    /// - Costs are finite and non-negative
    /// - The remote base URL is an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let t = &self.risk_tiers;
        if !t.high.is_finite() || !t.medium.is_finite() {
            errors.push("risk_tiers: cut points must be finite".to_string());
        } else if !(t.medium > 0.0 && t.medium < t.high && t.high <= 100.0) {
            errors.push(format!(
                "risk_tiers: expected 0 < medium ({}) < high ({}) <= 100",
                t.medium, t.high
            ));
        }

        if self.playback.tick_interval_ms == Some(0) {
            errors.push("playback.tick_interval_ms must be > 0".to_string());
        }
        if self.playback.sample_interval == 0 {
            errors.push("playback.sample_interval must be > 0".to_string());
        }
        if self.playback.history_capacity == 0 {
            errors.push("playback.history_capacity must be > 0".to_string());
        }
        if self.optimizer.debounce_ms == 0 {
            errors.push("optimizer.debounce_ms must be > 0".to_string());
        }
        if self.fleet.refresh_interval_ms == 0 {
            errors.push("fleet.refresh_interval_ms must be > 0".to_string());
        }
        if self.remote.request_timeout_ms == 0 {
            errors.push("remote.request_timeout_ms must be > 0".to_string());
        }

        for (name, v) in [
            ("optimizer.cost_fn", self.optimizer.cost_fn),
            ("optimizer.cost_fp", self.optimizer.cost_fp),
        ] {
            if !v.is_finite() || v < 0.0 {
                errors.push(format!("{} must be a finite, non-negative number (got {})", name, v));
            }
        }

        let url = self.remote.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("remote.base_url must be an http(s) URL (got '{}')", url));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Effective tick interval: explicit override or the domain default.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(
            self.playback
                .tick_interval_ms
                .unwrap_or_else(|| self.domain.default_tick_interval_ms()),
        )
    }

    /// Starting cost profile.
    pub fn initial_costs(&self) -> CostProfile {
        CostProfile {
            cost_fn: self.optimizer.cost_fn,
            cost_fp: self.optimizer.cost_fp,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {err}", path = .0.display(), err = .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({path}): {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// Remote scorer endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL, e.g. `http://localhost:8000`.
    ///
    /// Can be overridden by `FLEETWATCH_REMOTE_URL` env var or `--remote` CLI flag.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on any single request (ms)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    defaults::DEFAULT_REMOTE_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    defaults::REMOTE_REQUEST_TIMEOUT_MS
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Playback clock and buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Tick interval override (ms). Unset uses the domain default.
    #[serde(default)]
    pub tick_interval_ms: Option<u64>,

    /// Cursor stride in multi-entity mode
    #[serde(default = "default_sample_interval")]
    pub sample_interval: usize,

    /// Trend buffer capacity (points)
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_sample_interval() -> usize {
    defaults::MULTI_SAMPLE_INTERVAL
}

fn default_history_capacity() -> usize {
    defaults::HISTORY_BUFFER_CAPACITY
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: None,
            sample_interval: default_sample_interval(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Cost optimiser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Quiet period before a request is sent (ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_cost_fn")]
    pub cost_fn: f64,

    #[serde(default = "default_cost_fp")]
    pub cost_fp: f64,
}

fn default_debounce_ms() -> u64 {
    defaults::COST_DEBOUNCE_MS
}

fn default_cost_fn() -> f64 {
    defaults::DEFAULT_COST_FN
}

fn default_cost_fp() -> f64 {
    defaults::DEFAULT_COST_FP
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            cost_fn: default_cost_fn(),
            cost_fp: default_cost_fp(),
        }
    }
}

impl OptimizerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Fleet refresh and treemap sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Random jitter added to each refresh (ms)
    #[serde(default = "default_refresh_jitter_ms")]
    pub refresh_jitter_ms: u64,

    /// Treemap leaf size floor
    #[serde(default = "default_min_leaf_size")]
    pub min_leaf_size: f64,
}

fn default_refresh_interval_ms() -> u64 {
    defaults::FLEET_REFRESH_INTERVAL_MS
}

fn default_refresh_jitter_ms() -> u64 {
    defaults::FLEET_REFRESH_JITTER_MS
}

fn default_min_leaf_size() -> f64 {
    defaults::FLEET_MIN_LEAF_SIZE
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            refresh_jitter_ms: default_refresh_jitter_ms(),
            min_leaf_size: default_min_leaf_size(),
        }
    }
}

/// Outbound alert dispatch to `/alert/send`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlertConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `FLEETWATCH_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::DEFAULT_SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
