//! Simulation clock: one interval timer driving [`MonitorSession::tick`]

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::MonitorSession;

/// Tick the session until cancelled.
///
/// Ticks never overlap: the next one is awaited only after the previous
/// tick's state update committed. Late ticks are skipped rather than bunched.
pub async fn run(session: MonitorSession, cancel: CancellationToken) {
    let period = session.settings().tick_interval;
    info!(period_ms = period.as_millis() as u64, "[SimulationClock] Task starting");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("[SimulationClock] Received shutdown signal");
                break;
            }
            _ = interval.tick() => {
                let report = session.tick().await;
                if report.played > 0 {
                    debug!(played = report.played, "Tick");
                }
            }
        }
    }
}
