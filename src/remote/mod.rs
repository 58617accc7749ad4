//! Remote scorer: the prediction and optimisation service behind the dashboard
//!
//! The engine never talks HTTP directly. Everything goes through the
//! [`Scorer`] trait so tests can swap in an in-memory scorer.
//!
//! ## Unified endpoint families
//!
//! | Operation | product | turbine / generator |
//! |---|---|---|
//! | history | `GET /product/{id}` | `GET /{domain}/{Label}` |
//! | fleet status | `POST /fleet/status` | `POST /{domain}/fleet/status` |
//! | threshold | `POST /predict` | `POST /{domain}/predict/cost` |
//! | alert | `POST /alert/send` | `POST /alert/send` |

pub mod client;
pub mod wire;

pub use client::HttpScorer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::{CostProfile, Domain, EntityId, OptimizationDiagnostics, SensorRecord, SensorSnapshot};

/// Remote scorer errors.
///
/// Every variant is a NetworkFailure from the engine's point of view.
#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    ServerError(u16),
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Scorer unavailable: {0}")]
    Unavailable(String),
}

/// Current risk of one fleet member as reported by the scorer (0–100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetReading {
    pub label: String,
    pub risk: f64,
}

/// Threshold optimisation / live prediction result.
///
/// Product predictions carry `probability`/`status`/`recommendation`/`prediction`;
/// turbine and generator optimisations carry `strategy`/`optimization`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResponse {
    pub threshold: f64,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub optimization: Option<OptimizationDiagnostics>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub prediction: Option<u8>,
}

impl ThresholdResponse {
    /// Bare threshold result, handy for fakes.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            strategy: None,
            optimization: None,
            probability: None,
            status: None,
            recommendation: None,
            prediction: None,
        }
    }
}

/// Body of `/alert/send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub product_id: EntityId,
    pub risk_value: f64,
    pub sensor_data: BTreeMap<String, f64>,
}

/// Contract the engine expects from the remote scorer.
#[async_trait]
pub trait Scorer: Send + Sync + 'static {
    /// Ordered historical records of one entity.
    async fn fetch_history(
        &self,
        domain: Domain,
        id: &EntityId,
    ) -> Result<Vec<SensorRecord>, ScorerError>;

    /// Current risk of fleet members. `ids` may be empty for domains that
    /// report the whole fleet.
    async fn fetch_fleet_status(
        &self,
        domain: Domain,
        ids: &[EntityId],
    ) -> Result<Vec<FleetReading>, ScorerError>;

    /// Decision threshold for the given costs (and a prediction for the snapshot
    /// where the domain supports it).
    async fn fetch_optimal_threshold(
        &self,
        domain: Domain,
        snapshot: &SensorSnapshot,
        costs: &CostProfile,
    ) -> Result<ThresholdResponse, ScorerError>;

    /// Deliver an operator alert.
    async fn send_alert(&self, alert: &AlertRequest) -> Result<(), ScorerError>;
}
