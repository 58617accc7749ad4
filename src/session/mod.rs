//! Monitoring session: selection controller, playback clock, optimiser
//!
//! [`MonitorSession`] is a cheap-to-clone handle around one
//! `RwLock<SessionState>` and the remote [`Scorer`]. Local transitions are
//! synchronous methods on [`SessionState`] run under the write lock; the only
//! suspension points are remote calls, made with the lock released. Results
//! of those calls are applied only if the epoch or generation captured before
//! the call is still current.
//!
//! Background loops ([`clock::run`], [`fleet_sync::run`]) drive the session
//! until their `CancellationToken` fires.

pub mod clock;
pub mod fleet_sync;
mod live;
mod logs;
mod optimizer;
mod state;

pub use fleet_sync::FleetRefresh;
pub use logs::{LogEntry, LogFeed, LogKind};
pub use optimizer::RequestSlot;
pub use state::{SelectionMode, SessionSnapshot, SessionState, TickReport};

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::playback::{FetchAction, FetchOutcome};
use crate::remote::{Scorer, ScorerError};
use crate::types::{Domain, EntityId};

/// Errors surfaced by session operations to the control surface.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown field '{0}' for this domain")]
    UnknownField(String),
    #[error("Invalid value {value} for '{field}'")]
    InvalidValue { field: String, value: f64 },
    #[error("Sensor values are driven by playback while entities are selected")]
    PlaybackActive,
}

/// Timings resolved from config once at construction.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub domain: Domain,
    pub tick_interval: Duration,
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub fleet_refresh_interval: Duration,
    pub fleet_refresh_jitter: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            domain: config.domain,
            tick_interval: config.tick_interval(),
            debounce: config.optimizer.debounce(),
            request_timeout: config.remote.request_timeout(),
            fleet_refresh_interval: Duration::from_millis(config.fleet.refresh_interval_ms),
            fleet_refresh_jitter: Duration::from_millis(config.fleet.refresh_jitter_ms),
        }
    }
}

struct SessionInner {
    state: RwLock<SessionState>,
    scorer: Arc<dyn Scorer>,
    settings: SessionSettings,
}

/// Shared handle to one monitoring session.
#[derive(Clone)]
pub struct MonitorSession {
    inner: Arc<SessionInner>,
}

impl MonitorSession {
    pub fn new(config: &MonitorConfig, scorer: Arc<dyn Scorer>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(SessionState::new(config)),
                scorer,
                settings: SessionSettings::from_config(config),
            }),
        }
    }

    pub(crate) fn state(&self) -> &RwLock<SessionState> {
        &self.inner.state
    }

    pub(crate) fn scorer(&self) -> &dyn Scorer {
        self.inner.scorer.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    pub fn domain(&self) -> Domain {
        self.inner.settings.domain
    }

    /// Bound a remote call by the configured timeout.
    pub(crate) async fn call<T, F>(&self, fut: F) -> Result<T, ScorerError>
    where
        F: Future<Output = Result<T, ScorerError>>,
    {
        let limit = self.inner.settings.request_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(ScorerError::Timeout(limit)),
        }
    }

    // ========================================================================
    // History cache
    // ========================================================================

    /// Make sure an entity's history is cached. Returns whether it is.
    ///
    /// Concurrent calls for the same entity share one fetch. A failed fetch
    /// leaves the entity absent; nothing retries until the next call.
    pub async fn ensure_loaded(&self, id: &EntityId) -> bool {
        let action = self.state().write().await.cache.begin_fetch(id);

        match action {
            FetchAction::Cached => true,
            FetchAction::Wait(mut done) => {
                // Err only when the owner vanished; either way re-check the slot
                let _ = done.wait_for(|finished| *finished).await;
                self.state().read().await.cache.is_cached(id)
            }
            FetchAction::Fetch(ticket) => {
                let domain = self.domain();
                let result = self.call(self.scorer().fetch_history(domain, id)).await;
                if let Err(e) = &result {
                    warn!(entity = %id, error = %e, "History fetch failed");
                }

                let outcome = self.state().write().await.cache.complete_fetch(ticket, result);
                match outcome {
                    FetchOutcome::Stored(records) => {
                        info!(entity = %id, records, "History cached");
                        true
                    }
                    FetchOutcome::Stale => {
                        debug!(entity = %id, "History arrived after cache reset, dropped");
                        false
                    }
                    FetchOutcome::Failed => false,
                }
            }
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Replace the monitored set and drive the resulting transition.
    ///
    /// Returns once the histories needed by the new mode were requested and
    /// the fleet tree refreshed for it.
    pub async fn select(&self, ids: Vec<EntityId>) -> SelectionMode {
        let (epoch, mode) = {
            let mut st = self.state().write().await;
            if !st.apply_selection(ids) {
                return st.mode();
            }
            (st.selection_epoch(), st.mode())
        };
        self.drive_transition(epoch, mode).await
    }

    /// Add or remove one entity from the selection.
    pub async fn toggle_entity(&self, id: EntityId) -> SelectionMode {
        let (epoch, mode) = {
            let mut st = self.state().write().await;
            if !st.toggle_selection(id) {
                return st.mode();
            }
            (st.selection_epoch(), st.mode())
        };
        self.drive_transition(epoch, mode).await
    }

    /// Clear-all: empty selection and drop every cached history.
    pub async fn clear_selection(&self) {
        {
            let mut st = self.state().write().await;
            st.apply_selection(Vec::new());
            st.cache.clear();
        }
        info!("Selection cleared, history cache dropped");

        if let Err(e) = self.refresh_fleet().await {
            warn!(error = %e, "Fleet refresh after clear-all failed");
        }
    }

    /// Load what the mode applied at `epoch` needs, then refresh the fleet.
    async fn drive_transition(&self, epoch: u64, mode: SelectionMode) -> SelectionMode {
        match &mode {
            SelectionMode::Empty => {}
            SelectionMode::Single(id) => {
                if self.ensure_loaded(id).await {
                    self.state().write().await.seed_single(epoch, id);
                }
            }
            SelectionMode::Multi(ids) => {
                let loaded = join_all(ids.iter().map(|id| self.ensure_loaded(id))).await;
                let missing = loaded.iter().filter(|ok| !**ok).count();
                if missing > 0 {
                    debug!(missing, "Some selected entities have no history yet");
                }
            }
        }

        if let Err(e) = self.refresh_fleet().await {
            warn!(error = %e, "Fleet refresh after selection change failed");
        }
        mode
    }

    // ========================================================================
    // Clock
    // ========================================================================

    /// One clock tick. Alerts are dispatched after the lock is released.
    pub async fn tick(&self) -> TickReport {
        let report = self.state().write().await.tick();

        if let Some(alert) = report.alert.clone() {
            let session = self.clone();
            tokio::spawn(async move {
                match session.call(session.scorer().send_alert(&alert)).await {
                    Ok(()) => info!(entity = %alert.product_id, risk = alert.risk_value, "Alert dispatched"),
                    Err(e) => warn!(entity = %alert.product_id, error = %e, "Alert dispatch failed"),
                }
            });
        }
        report
    }

    pub async fn start(&self) -> bool {
        let mut st = self.state().write().await;
        st.set_running(true);
        st.is_running()
    }

    pub async fn stop(&self) {
        self.state().write().await.set_running(false);
    }

    /// Start/pause toggle with a log entry. Returns the new running state.
    pub async fn toggle_clock(&self) -> bool {
        self.state().write().await.toggle_clock()
    }

    pub async fn is_running(&self) -> bool {
        self.state().read().await.is_running()
    }

    /// Stop and rewind playback, keeping selection and cached histories.
    pub async fn reset(&self) {
        self.state().write().await.reset();
        info!("Simulation reset");
    }

    // ========================================================================
    // Fleet
    // ========================================================================

    /// Pull the remote fleet status once.
    pub async fn refresh_fleet(&self) -> Result<FleetRefresh, ScorerError> {
        let Some((generation, ids)) = self.state().write().await.begin_fleet_refresh() else {
            return Ok(FleetRefresh::Cleared);
        };

        let readings = self
            .call(self.scorer().fetch_fleet_status(self.domain(), &ids))
            .await?;

        let applied = self
            .state()
            .write()
            .await
            .complete_fleet_refresh(generation, readings.into_iter().map(|r| (r.label, r.risk)));

        Ok(match applied {
            Some(leaves) => FleetRefresh::Applied(leaves),
            None => {
                debug!(generation, "Fleet status superseded, dropped");
                FleetRefresh::Stale
            }
        })
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state().read().await.snapshot()
    }
}
