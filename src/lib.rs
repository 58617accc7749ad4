//! fleetwatch: playback and risk-state engine for equipment monitoring
//!
//! Drives the dashboard of a predictive-maintenance deployment (machine
//! tools, wind turbines, generators) from historical telemetry and a remote
//! failure-risk scorer.
//!
//! ## Architecture
//!
//! - **Playback**: per-entity history cache, cursors and trend buffers
//! - **Risk**: displayed-risk suppression, fleet treemap bucketing, local fallback scoring
//! - **Remote**: the `Scorer` seam and its reqwest client
//! - **Session**: selection state machine, simulation clock, debounced cost optimiser
//! - **API**: JSON snapshot and control endpoints

pub mod api;
pub mod config;
pub mod playback;
pub mod remote;
pub mod risk;
pub mod session;
pub mod types;

// Re-export configuration
pub use config::MonitorConfig;

// Re-export commonly used types
pub use types::{
    CostField, CostProfile, Domain, EntityId, FleetTree, RiskAnalysis, RiskTier, RiskTiers,
    SensorRecord, SensorSnapshot,
};

// Re-export the remote seam
pub use remote::{HttpScorer, Scorer, ScorerError};

// Re-export session components
pub use session::{MonitorSession, SelectionMode, SessionError, SessionSnapshot};
