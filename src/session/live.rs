//! Live prediction while nothing is selected

use tracing::{debug, warn};

use super::{MonitorSession, SessionError};

impl MonitorSession {
    /// Overwrite one sensor value and score the resulting snapshot.
    ///
    /// Only allowed without a selection; during playback the records drive
    /// the snapshot. Latest request wins: an answer that arrives after a newer
    /// update or a selection change is dropped. When the scorer is
    /// unreachable the local heuristic stands in.
    pub async fn update_sensor(&self, field: &str, value: f64) -> Result<(), SessionError> {
        if !value.is_finite() {
            return Err(SessionError::InvalidValue {
                field: field.to_string(),
                value,
            });
        }

        let (generation, epoch, sensors, costs) = {
            let mut st = self.state().write().await;
            if !st.selection().is_empty() {
                return Err(SessionError::PlaybackActive);
            }
            if !st.sensors.set(field, value) {
                return Err(SessionError::UnknownField(field.to_string()));
            }
            let generation = st.prediction.next();
            (generation, st.selection_epoch(), st.sensors.clone(), st.costs)
        };

        let result = self
            .call(self.scorer().fetch_optimal_threshold(self.domain(), &sensors, &costs))
            .await;

        let mut st = self.state().write().await;
        if !st.prediction.settle(generation) || st.selection_epoch() != epoch {
            debug!(generation, "Discarding superseded prediction");
            return Ok(());
        }

        match result {
            Ok(resp) => st.apply_prediction(&resp),
            Err(e) => {
                let scored = st.apply_fallback();
                warn!(error = %e, local_fallback = scored, "Prediction failed");
            }
        }
        Ok(())
    }
}
