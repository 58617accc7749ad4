//! Monitor Configuration Module
//!
//! Provides the engine configuration loaded from TOML, replacing hardcoded
//! timings and cut points with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `FLEETWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `fleetwatch.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(MonitorConfig::load());
//!
//! // Anywhere in the codebase:
//! let debounce = config::get().optimizer.debounce_ms;
//! ```

mod monitor_config;
pub mod defaults;

pub use monitor_config::*;

use std::sync::OnceLock;

/// Global monitor configuration, initialized once at startup.
static MONITOR_CONFIG: OnceLock<MonitorConfig> = OnceLock::new();

/// Initialize the global monitor configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: MonitorConfig) {
    if MONITOR_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global monitor configuration.
///
/// Falls back to built-in defaults when `init()` was never called, so library
/// users and tests can construct sessions without a startup step.
pub fn get() -> &'static MonitorConfig {
    MONITOR_CONFIG.get_or_init(MonitorConfig::default)
}
