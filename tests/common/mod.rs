//! Shared fixtures: an in-memory scorer and session builders.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetwatch::remote::{AlertRequest, FleetReading, Scorer, ScorerError, ThresholdResponse};
use fleetwatch::{
    CostProfile, Domain, EntityId, MonitorConfig, MonitorSession, SensorRecord, SensorSnapshot,
};

/// Scorer double with scripted answers, per-call delays and a call log.
#[derive(Default)]
pub struct FakeScorer {
    histories: Mutex<HashMap<EntityId, Vec<SensorRecord>>>,
    history_delay: Mutex<Duration>,
    fleet: Mutex<Vec<FleetReading>>,
    fleet_delays: Mutex<VecDeque<Duration>>,
    threshold_delays: Mutex<VecDeque<Duration>>,
    prediction: Mutex<Option<ThresholdResponse>>,
    offline: AtomicBool,

    history_calls: Mutex<Vec<EntityId>>,
    fleet_calls: Mutex<Vec<Vec<EntityId>>>,
    threshold_calls: Mutex<Vec<(SensorSnapshot, CostProfile)>>,
    alerts: Mutex<Vec<AlertRequest>>,
}

impl FakeScorer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_history(&self, id: u64, risks: &[f64]) {
        let records = risks
            .iter()
            .enumerate()
            .map(|(i, r)| SensorRecord::new(*r).with_field("torque", 30.0 + i as f64))
            .collect();
        self.histories.lock().unwrap().insert(EntityId::from(id), records);
    }

    pub fn set_history_delay(&self, delay: Duration) {
        *self.history_delay.lock().unwrap() = delay;
    }

    pub fn set_fleet(&self, readings: &[(&str, f64)]) {
        *self.fleet.lock().unwrap() = readings
            .iter()
            .map(|(label, risk)| FleetReading {
                label: label.to_string(),
                risk: *risk,
            })
            .collect();
    }

    pub fn push_fleet_delay(&self, delay: Duration) {
        self.fleet_delays.lock().unwrap().push_back(delay);
    }

    pub fn push_threshold_delay(&self, delay: Duration) {
        self.threshold_delays.lock().unwrap().push_back(delay);
    }

    /// Fixed answer for every threshold/prediction call.
    pub fn set_prediction(&self, resp: ThresholdResponse) {
        *self.prediction.lock().unwrap() = Some(resp);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn history_calls(&self) -> Vec<EntityId> {
        self.history_calls.lock().unwrap().clone()
    }

    pub fn fleet_calls(&self) -> Vec<Vec<EntityId>> {
        self.fleet_calls.lock().unwrap().clone()
    }

    pub fn threshold_calls(&self) -> Vec<(SensorSnapshot, CostProfile)> {
        self.threshold_calls.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<AlertRequest> {
        self.alerts.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<(), ScorerError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ScorerError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(d) = delay.filter(|d| !d.is_zero()) {
        tokio::time::sleep(d).await;
    }
}

#[async_trait]
impl Scorer for FakeScorer {
    async fn fetch_history(
        &self,
        _domain: Domain,
        id: &EntityId,
    ) -> Result<Vec<SensorRecord>, ScorerError> {
        self.history_calls.lock().unwrap().push(id.clone());
        let delay = *self.history_delay.lock().unwrap();
        pause(Some(delay)).await;
        self.check_online()?;
        let records = self.histories.lock().unwrap().get(id).cloned();
        records.ok_or(ScorerError::ServerError(404))
    }

    async fn fetch_fleet_status(
        &self,
        _domain: Domain,
        ids: &[EntityId],
    ) -> Result<Vec<FleetReading>, ScorerError> {
        self.fleet_calls.lock().unwrap().push(ids.to_vec());
        let delay = self.fleet_delays.lock().unwrap().pop_front();
        pause(delay).await;
        self.check_online()?;
        let readings = self.fleet.lock().unwrap().clone();
        Ok(readings)
    }

    /// Answers with the cost-optimal threshold `fp / (fp + fn)`; product
    /// snapshots also get a probability of `torque / 100`.
    async fn fetch_optimal_threshold(
        &self,
        domain: Domain,
        snapshot: &SensorSnapshot,
        costs: &CostProfile,
    ) -> Result<ThresholdResponse, ScorerError> {
        self.threshold_calls
            .lock()
            .unwrap()
            .push((snapshot.clone(), *costs));
        let delay = self.threshold_delays.lock().unwrap().pop_front();
        pause(delay).await;
        self.check_online()?;

        if let Some(fixed) = self.prediction.lock().unwrap().clone() {
            return Ok(fixed);
        }
        let mut resp =
            ThresholdResponse::with_threshold(costs.cost_fp / (costs.cost_fp + costs.cost_fn));
        resp.strategy = Some("cost_sensitive".to_string());
        if domain == Domain::Product {
            resp.probability = snapshot.get("torque").map(|t| t / 100.0);
            resp.prediction = Some(0);
        }
        Ok(resp)
    }

    async fn send_alert(&self, alert: &AlertRequest) -> Result<(), ScorerError> {
        self.check_online()?;
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

pub fn config(domain: Domain) -> MonitorConfig {
    let mut config = MonitorConfig {
        domain,
        ..MonitorConfig::default()
    };
    config.fleet.refresh_jitter_ms = 0;
    config
}

pub fn session(domain: Domain, scorer: &Arc<FakeScorer>) -> MonitorSession {
    session_with(&config(domain), scorer)
}

pub fn session_with(config: &MonitorConfig, scorer: &Arc<FakeScorer>) -> MonitorSession {
    let scorer: Arc<dyn Scorer> = scorer.clone();
    MonitorSession::new(config, scorer)
}

pub fn ids(raw: &[u64]) -> Vec<EntityId> {
    raw.iter().map(|id| EntityId::from(*id)).collect()
}
