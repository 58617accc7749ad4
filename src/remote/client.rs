//! HTTP scorer client: reqwest implementation of [`Scorer`]

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::wire::{fleet_request_body, FleetPayload, HistoryPayload};
use super::{AlertRequest, FleetReading, Scorer, ScorerError, ThresholdResponse};
use crate::config::RemoteConfig;
use crate::types::{CostProfile, Domain, EntityId, SensorRecord, SensorSnapshot};

/// HTTP client for the remote scorer.
#[derive(Clone)]
pub struct HttpScorer {
    http: reqwest::Client,
    base_url: String,
}

impl HttpScorer {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScorerError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(remote: &RemoteConfig) -> Result<Self, ScorerError> {
        Self::new(&remote.base_url, remote.request_timeout())
    }

    /// Base URL for logging
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check the status, then decode the body.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ScorerError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ScorerError::ServerError(status.as_u16()));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    async fn fetch_history(
        &self,
        domain: Domain,
        id: &EntityId,
    ) -> Result<Vec<SensorRecord>, ScorerError> {
        let url = self.url(&domain.history_path(id));
        debug!(%url, "Fetching entity history");
        let resp = self.http.get(url).send().await?;
        let payload: HistoryPayload = Self::decode(resp).await?;
        Ok(payload.into_records())
    }

    async fn fetch_fleet_status(
        &self,
        domain: Domain,
        ids: &[EntityId],
    ) -> Result<Vec<FleetReading>, ScorerError> {
        let resp = self
            .http
            .post(self.url(domain.fleet_status_path()))
            .json(&fleet_request_body(domain, ids))
            .send()
            .await?;
        let payload: FleetPayload = Self::decode(resp).await?;
        Ok(payload.into_readings())
    }

    async fn fetch_optimal_threshold(
        &self,
        domain: Domain,
        snapshot: &SensorSnapshot,
        costs: &CostProfile,
    ) -> Result<ThresholdResponse, ScorerError> {
        let resp = self
            .http
            .post(self.url(domain.threshold_path()))
            .json(&snapshot.to_request_body(costs))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn send_alert(&self, alert: &AlertRequest) -> Result<(), ScorerError> {
        let resp = self
            .http
            .post(self.url("/alert/send"))
            .json(alert)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ScorerError::ServerError(resp.status().as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = HttpScorer::new("http://scorer.local:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.base_url(), "http://scorer.local:8000");
        assert_eq!(c.url("/predict"), "http://scorer.local:8000/predict");
    }
}
