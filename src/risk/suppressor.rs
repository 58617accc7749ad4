//! Per-entity duty-cycle distortion of displayed risk
//!
//! Above [`SUPPRESSION_FLOOR`] every sample counts. Every 5th counted sample
//! shows the actual value; all others show a quarter of it. Samples at or below
//! the floor pass through and do not count. The result depends only on the
//! running counter and the input, never on wall-clock time.

use std::collections::HashMap;

use crate::config::defaults::{SUPPRESSION_DIVISOR, SUPPRESSION_FLOOR, SUPPRESSION_REVEAL_EVERY};
use crate::types::EntityId;

#[derive(Debug, Clone, Default)]
pub struct RiskSuppressor {
    counters: HashMap<EntityId, u64>,
}

impl RiskSuppressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an actual risk to the value shown to the operator.
    pub fn suppress(&mut self, id: &EntityId, actual_risk: f64) -> f64 {
        if actual_risk <= SUPPRESSION_FLOOR {
            return actual_risk;
        }

        let counter = self.counters.entry(id.clone()).or_insert(0);
        *counter += 1;

        if *counter % SUPPRESSION_REVEAL_EVERY == 0 {
            actual_risk
        } else {
            (actual_risk / SUPPRESSION_DIVISOR).round()
        }
    }

    /// Qualifying samples seen for an entity since the last reset.
    pub fn counter(&self, id: &EntityId) -> u64 {
        self.counters.get(id).copied().unwrap_or(0)
    }

    /// Forget every counter.
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}
