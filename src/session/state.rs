//! Synchronous session state: selection, playback, suppression, buffers
//!
//! Everything here runs to completion under the session write lock. Async
//! work (fetches, optimisation) lives in the parent module and only touches
//! this state through short critical sections guarded by epochs/generations.

use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::logs::{LogEntry, LogFeed, LogKind};
use super::optimizer::RequestSlot;
use crate::config::defaults::{
    LIVE_WARNING_PROBABILITY, LOG_DEDUP_WINDOW_MS, LOG_FEED_CAPACITY, SINGLE_STEP,
};
use crate::config::MonitorConfig;
use crate::playback::{DisplayHistoryBuffer, HistoryCache, MultiPoint, PlaybackCursor, SinglePoint};
use crate::remote::{AlertRequest, ThresholdResponse};
use crate::risk::{fallback, FleetAggregator, RiskSuppressor};
use crate::types::{
    CostProfile, Domain, EntityId, FleetTree, RiskAnalysis, RiskTier, RiskTiers, SensorRecord,
    SensorSnapshot,
};

/// Monitoring mode derived from the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Nothing selected: clock stopped, live prediction from the sensor snapshot.
    Empty,
    /// One entity, step-1 playback.
    Single(EntityId),
    /// Two or more entities, synchronized strided playback.
    Multi(Vec<EntityId>),
}

impl SelectionMode {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionMode::Empty => "empty",
            SelectionMode::Single(_) => "single",
            SelectionMode::Multi(_) => "multi",
        }
    }
}

/// What one clock tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Entities whose cursor advanced
    pub played: usize,
    /// Alert to dispatch once the lock is released
    pub alert: Option<AlertRequest>,
}

pub struct SessionState {
    pub(crate) domain: Domain,
    selection: Vec<EntityId>,
    selection_epoch: u64,
    running: bool,

    pub(crate) cache: HistoryCache,
    cursor: PlaybackCursor,
    suppressor: RiskSuppressor,
    aggregator: FleetAggregator,
    tiers: RiskTiers,
    sample_interval: usize,
    alerts_enabled: bool,

    single_history: DisplayHistoryBuffer<SinglePoint>,
    multi_history: DisplayHistoryBuffer<MultiPoint>,
    current_record: Option<SensorRecord>,
    pub(crate) sensors: SensorSnapshot,
    pub(crate) analysis: RiskAnalysis,
    pub(crate) costs: CostProfile,

    live_fleet: FleetTree,
    remote_fleet: FleetTree,
    fleet_generation: u64,

    pub(crate) logs: LogFeed,
    pub(crate) optimizer: RequestSlot,
    pub(crate) prediction: RequestSlot,
}

impl SessionState {
    pub fn new(config: &MonitorConfig) -> Self {
        let capacity = config.playback.history_capacity;
        Self {
            domain: config.domain,
            selection: Vec::new(),
            selection_epoch: 0,
            running: false,
            cache: HistoryCache::new(),
            cursor: PlaybackCursor::new(),
            suppressor: RiskSuppressor::new(),
            aggregator: FleetAggregator::new(config.risk_tiers, config.fleet.min_leaf_size),
            tiers: config.risk_tiers,
            sample_interval: config.playback.sample_interval.max(1),
            alerts_enabled: config.alerts.enabled,
            single_history: DisplayHistoryBuffer::new(capacity),
            multi_history: DisplayHistoryBuffer::new(capacity),
            current_record: None,
            sensors: SensorSnapshot::defaults(config.domain),
            analysis: RiskAnalysis::default(),
            costs: config.initial_costs(),
            live_fleet: FleetTree::default(),
            remote_fleet: FleetTree::default(),
            fleet_generation: 0,
            logs: LogFeed::new(LOG_FEED_CAPACITY),
            optimizer: RequestSlot::default(),
            prediction: RequestSlot::default(),
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn mode(&self) -> SelectionMode {
        match self.selection.as_slice() {
            [] => SelectionMode::Empty,
            [only] => SelectionMode::Single(only.clone()),
            many => SelectionMode::Multi(many.to_vec()),
        }
    }

    pub fn selection(&self) -> &[EntityId] {
        &self.selection
    }

    pub fn selection_epoch(&self) -> u64 {
        self.selection_epoch
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Replace the selection. Returns `false` when the set is unchanged.
    ///
    /// A change always starts from a clean slate: cursors, suppression
    /// counters, both trend buffers and the live fleet tree are reset, and
    /// the selection epoch moves so in-flight work for the old set is
    /// discarded. Cached histories survive.
    pub fn apply_selection(&mut self, ids: Vec<EntityId>) -> bool {
        // Ids sharing a label address the same unit
        let mut deduped: Vec<EntityId> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.position_of(&deduped, &id).is_none() {
                deduped.push(id);
            }
        }
        if deduped == self.selection {
            return false;
        }

        self.selection = deduped;
        self.selection_epoch += 1;
        self.cursor.reset();
        self.suppressor.reset();
        self.single_history.clear();
        self.multi_history.clear();
        self.live_fleet = FleetTree::default();
        self.current_record = None;

        match self.mode() {
            SelectionMode::Empty => {
                self.running = false;
                self.remote_fleet = FleetTree::default();
                self.fleet_generation += 1;
            }
            // Started once the history is in
            SelectionMode::Single(_) => self.running = false,
            SelectionMode::Multi(_) => self.running = true,
        }

        info!(
            mode = self.mode().name(),
            entities = self.selection.len(),
            epoch = self.selection_epoch,
            "Selection changed"
        );
        true
    }

    /// Add `id` to the selection, or remove it when already selected.
    /// Same contract as [`apply_selection`](Self::apply_selection).
    pub fn toggle_selection(&mut self, id: EntityId) -> bool {
        let mut ids = self.selection.clone();
        match self.position_of(&ids, &id) {
            Some(idx) => {
                ids.remove(idx);
            }
            None => ids.push(id),
        }
        self.apply_selection(ids)
    }

    fn position_of(&self, ids: &[EntityId], id: &EntityId) -> Option<usize> {
        let label = self.domain.label(id);
        ids.iter()
            .position(|existing| existing == id || self.domain.label(existing) == label)
    }

    /// Show the first record of a freshly loaded single selection and start
    /// the clock. Ignored when the selection moved on since `epoch`.
    pub fn seed_single(&mut self, epoch: u64, id: &EntityId) -> bool {
        if epoch != self.selection_epoch || self.mode() != SelectionMode::Single(id.clone()) {
            debug!(entity = %id, "Selection changed during history load, not seeding");
            return false;
        }
        let Some(records) = self.cache.get(id) else {
            return false;
        };

        self.cursor.rewind(id);
        if let Some(first) = records.first().cloned() {
            self.sensors.apply_record(&first);
            self.current_record = Some(first);
        }
        self.running = true;
        true
    }

    // ========================================================================
    // Clock
    // ========================================================================

    /// Advance playback by one tick.
    pub fn tick(&mut self) -> TickReport {
        if !self.running {
            return TickReport::default();
        }
        match self.mode() {
            SelectionMode::Empty => TickReport::default(),
            SelectionMode::Single(id) => self.tick_single(&id),
            SelectionMode::Multi(ids) => self.tick_multi(&ids),
        }
    }

    fn tick_single(&mut self, id: &EntityId) -> TickReport {
        let Some(records) = self.cache.get(id) else {
            return TickReport::default();
        };
        let Some(idx) = self.cursor.advance(id, SINGLE_STEP, records.len()) else {
            return TickReport::default();
        };
        let record = records[idx].clone();

        let actual = record.risk;
        let displayed = self.suppressor.suppress(id, actual);
        let shown_tier = self.tiers.classify(displayed);

        self.sensors.apply_record(&record);
        self.analysis = RiskAnalysis {
            risk: displayed,
            label: shown_tier.status().to_string(),
            reason: shown_tier.category_name().to_string(),
            ..self.analysis.clone()
        };
        self.single_history.push(SinglePoint {
            time: Utc::now(),
            risk: displayed,
            values: self.sensors.values.clone(),
        });
        self.current_record = Some(record);

        let mut report = TickReport {
            played: 1,
            alert: None,
        };
        if self.tiers.classify(actual) == RiskTier::High {
            let label = self.domain.label(id);
            self.logs
                .push(LogKind::Critical, format!("{label}: Critical failure risk detected"));
            if self.alerts_enabled {
                report.alert = Some(AlertRequest {
                    product_id: id.clone(),
                    risk_value: actual,
                    sensor_data: self.sensors.values.clone(),
                });
            }
        }
        report
    }

    fn tick_multi(&mut self, ids: &[EntityId]) -> TickReport {
        let mut risks = BTreeMap::new();
        for id in ids {
            let Some(records) = self.cache.get(id) else {
                continue;
            };
            let Some(idx) = self.cursor.advance(id, self.sample_interval, records.len()) else {
                continue;
            };
            let actual = records[idx].risk;
            let displayed = self.suppressor.suppress(id, actual);
            risks.insert(self.domain.label(id), displayed);
        }

        let played = risks.len();
        if played > 0 {
            self.live_fleet = self
                .aggregator
                .aggregate(risks.iter().map(|(label, risk)| (label.clone(), *risk)));
            self.multi_history.push(MultiPoint {
                time: Utc::now(),
                risks,
            });
        }
        TickReport {
            played,
            alert: None,
        }
    }

    /// Flip the clock. No-op without a selection.
    pub fn toggle_clock(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.running = !self.running;
        let message = if self.running {
            "Simulation started"
        } else {
            "Simulation paused"
        };
        self.logs.push(LogKind::Info, message);
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running && !self.selection.is_empty();
    }

    /// Stop, rewind and forget playback output. Selection and cache survive.
    pub fn reset(&mut self) {
        self.running = false;
        self.cursor.reset();
        self.suppressor.reset();
        self.single_history.clear();
        self.multi_history.clear();
        self.live_fleet = FleetTree::default();
        self.remote_fleet = FleetTree::default();
        self.fleet_generation += 1;
        self.current_record = None;
        self.sensors = SensorSnapshot::defaults(self.domain);
        self.analysis = RiskAnalysis {
            threshold: self.analysis.threshold,
            strategy: self.analysis.strategy.take(),
            optimization: self.analysis.optimization.take(),
            is_optimizing: self.analysis.is_optimizing,
            ..RiskAnalysis::default()
        };
        self.logs.replace(LogKind::Info, "Simulation reset");
    }

    // ========================================================================
    // Remote results
    // ========================================================================

    /// Apply a threshold optimisation result.
    pub fn apply_threshold(&mut self, resp: &ThresholdResponse) {
        self.analysis.threshold = resp.threshold;
        self.analysis.strategy = resp.strategy.clone();
        self.analysis.optimization = resp.optimization.clone();
        self.analysis.is_optimizing = false;

        let strategy = resp.strategy.as_deref().unwrap_or("cost_sensitive");
        self.logs.push(
            LogKind::Info,
            format!("Threshold optimized: {:.4} ({})", resp.threshold, strategy),
        );
    }

    /// Apply a live prediction for the current sensor snapshot.
    pub fn apply_prediction(&mut self, resp: &ThresholdResponse) {
        let mut analysis = RiskAnalysis {
            threshold: resp.threshold,
            is_optimizing: self.analysis.is_optimizing,
            ..self.analysis.clone()
        };
        if let Some(probability) = resp.probability {
            analysis.risk = (probability * 100.0).round();
        }
        if let Some(status) = &resp.status {
            analysis.label = status.clone();
        }
        if let Some(recommendation) = &resp.recommendation {
            analysis.reason = recommendation.clone();
        }
        if resp.strategy.is_some() {
            analysis.strategy = resp.strategy.clone();
            analysis.optimization = resp.optimization.clone();
        }
        self.analysis = analysis;

        let window = Duration::milliseconds(LOG_DEDUP_WINDOW_MS);
        if resp.prediction == Some(1) {
            let message = resp.status.clone().unwrap_or_else(|| "Failure predicted".to_string());
            self.logs.push_deduped(LogKind::Danger, message, window);
        } else if resp
            .probability
            .is_some_and(|p| p > LIVE_WARNING_PROBABILITY)
        {
            self.logs.push_deduped(LogKind::Warning, "High Risk Warning", window);
        }
        self.push_live_point();
    }

    /// Score the snapshot locally after a failed prediction. Domains without
    /// a heuristic keep the last known analysis.
    pub fn apply_fallback(&mut self) -> bool {
        let Some(local) = fallback::assess(&self.sensors) else {
            return false;
        };
        self.analysis = RiskAnalysis {
            risk: local.risk,
            label: local.label.to_string(),
            reason: local.reason.to_string(),
            ..self.analysis.clone()
        };
        self.push_live_point();
        true
    }

    fn push_live_point(&mut self) {
        self.single_history.push(SinglePoint {
            time: Utc::now(),
            risk: self.analysis.risk,
            values: self.sensors.values.clone(),
        });
    }

    /// Claim a fleet refresh. `None` means the tree was cleared locally and
    /// no request is needed.
    pub fn begin_fleet_refresh(&mut self) -> Option<(u64, Vec<EntityId>)> {
        self.fleet_generation += 1;
        if self.domain.fleet_requires_selection() && self.selection.is_empty() {
            self.remote_fleet = FleetTree::default();
            return None;
        }
        Some((self.fleet_generation, self.selection.clone()))
    }

    /// Install a remote fleet tree if no later refresh or selection change
    /// happened since `generation`.
    pub fn complete_fleet_refresh<I>(&mut self, generation: u64, readings: I) -> Option<usize>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        if generation != self.fleet_generation {
            return None;
        }
        self.remote_fleet = self.aggregator.aggregate(readings);
        Some(self.remote_fleet.leaf_count())
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            domain: self.domain,
            mode: self.mode().name(),
            selection: self.selection.clone(),
            running: self.running,
            current_record: self.current_record.clone(),
            sensors: self.sensors.values.clone(),
            analysis: self.analysis.clone(),
            costs: self.costs,
            single_history: self.single_history.iter().cloned().collect(),
            multi_history: self.multi_history.iter().cloned().collect(),
            live_fleet: self.live_fleet.clone(),
            fleet: self.remote_fleet.clone(),
            logs: self.logs.iter().cloned().collect(),
            cached_entities: self.cache.cached_count(),
            loading: self
                .selection
                .iter()
                .filter(|id| self.cache.is_loading(id))
                .cloned()
                .collect(),
        }
    }

    // Test hooks
    #[cfg(test)]
    pub(crate) fn suppression_counter(&self, id: &EntityId) -> u64 {
        self.suppressor.counter(id)
    }

    #[cfg(test)]
    pub(crate) fn cursor_position(&self, id: &EntityId) -> usize {
        self.cursor.position(id)
    }
}

/// Everything the render layer needs, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub domain: Domain,
    pub mode: &'static str,
    pub selection: Vec<EntityId>,
    pub running: bool,
    pub current_record: Option<SensorRecord>,
    pub sensors: BTreeMap<String, f64>,
    pub analysis: RiskAnalysis,
    pub costs: CostProfile,
    pub single_history: Vec<SinglePoint>,
    pub multi_history: Vec<MultiPoint>,
    /// Aggregated from displayed risks during multi playback
    pub live_fleet: FleetTree,
    /// Last remote fleet status
    pub fleet: FleetTree,
    pub logs: Vec<LogEntry>,
    pub cached_entities: usize,
    pub loading: Vec<EntityId>,
}
