//! Debounced cost-threshold optimisation
//!
//! Each cost update bumps the slot generation and aborts the pending task,
//! then schedules a fresh one. The task sleeps through the debounce window,
//! asks the scorer and applies the answer only if its generation is still
//! the latest. An aborted or superseded task never writes.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{MonitorSession, SessionError};
use crate::types::CostField;

/// Latest-request-wins bookkeeping for one logical remote operation.
#[derive(Debug, Default)]
pub struct RequestSlot {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl RequestSlot {
    /// Supersede whatever is outstanding and return the new generation.
    pub fn next(&mut self) -> u64 {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
        self.generation
    }

    pub fn arm(&mut self, handle: JoinHandle<()>) {
        self.pending = Some(handle);
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Mark `generation` finished. `false` if a newer request exists.
    pub fn settle(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl MonitorSession {
    /// Write one cost immediately and schedule a debounced re-optimisation.
    pub async fn update_cost(&self, field: CostField, value: f64) -> Result<(), SessionError> {
        if !value.is_finite() || value < 0.0 {
            return Err(SessionError::InvalidValue {
                field: field.as_str().to_string(),
                value,
            });
        }

        let mut st = self.state().write().await;
        st.costs.set(field, value);
        st.analysis.is_optimizing = true;

        let generation = st.optimizer.next();
        let session = self.clone();
        st.optimizer
            .arm(tokio::spawn(async move { session.run_optimization(generation).await }));

        debug!(field = field.as_str(), value, generation, "Cost updated, optimisation scheduled");
        Ok(())
    }

    async fn run_optimization(&self, generation: u64) {
        tokio::time::sleep(self.settings().debounce).await;

        let (domain, sensors, costs) = {
            let st = self.state().read().await;
            if !st.optimizer.is_current(generation) {
                return;
            }
            (st.domain, st.sensors.clone(), st.costs)
        };

        let result = self
            .call(self.scorer().fetch_optimal_threshold(domain, &sensors, &costs))
            .await;

        let mut st = self.state().write().await;
        if !st.optimizer.settle(generation) {
            debug!(generation, "Discarding superseded threshold result");
            return;
        }

        match result {
            Ok(resp) => {
                info!(
                    threshold = resp.threshold,
                    strategy = resp.strategy.as_deref().unwrap_or("-"),
                    cost_fn = costs.cost_fn,
                    cost_fp = costs.cost_fp,
                    "Threshold optimized"
                );
                st.apply_threshold(&resp);
            }
            Err(e) => {
                st.analysis.is_optimizing = false;
                warn!(error = %e, "Threshold optimisation failed, keeping previous threshold");
            }
        }
    }
}
