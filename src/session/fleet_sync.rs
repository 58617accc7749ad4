//! Periodic fleet-status refresh with backoff

use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::MonitorSession;
use crate::config::defaults::FLEET_REFRESH_MAX_BACKOFF_EXPONENT;

/// Outcome of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetRefresh {
    /// Tree replaced (leaf count)
    Applied(usize),
    /// No selection where one is required; tree cleared without a request
    Cleared,
    /// A newer refresh or selection change won; response dropped
    Stale,
}

/// Delay before the next attempt after `consecutive_failures` failures.
pub fn backoff_delay(interval: Duration, consecutive_failures: u32) -> Duration {
    if consecutive_failures == 0 {
        return interval;
    }
    let factor = 1u32 << consecutive_failures.min(FLEET_REFRESH_MAX_BACKOFF_EXPONENT);
    interval.saturating_mul(factor)
}

fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
}

/// Refresh the fleet tree until cancelled.
pub async fn run(session: MonitorSession, cancel: CancellationToken) {
    let interval = session.settings().fleet_refresh_interval;
    let max_jitter = session.settings().fleet_refresh_jitter;
    info!(interval_ms = interval.as_millis() as u64, "[FleetRefresh] Task starting");

    let mut consecutive_failures: u32 = 0;
    loop {
        match session.refresh_fleet().await {
            Ok(outcome) => {
                consecutive_failures = 0;
                debug!(?outcome, "Fleet refresh");
            }
            Err(e) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                warn!(
                    error = %e,
                    consecutive_failures,
                    next_retry_ms = backoff_delay(interval, consecutive_failures).as_millis() as u64,
                    "Fleet refresh failed, backing off"
                );
            }
        }

        let delay = backoff_delay(interval, consecutive_failures) + jitter(max_jitter);
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("[FleetRefresh] Received shutdown signal");
                break;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let base = Duration::from_secs(5);
        assert_eq!(backoff_delay(base, 0), base);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(10));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(20));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(40));
        assert_eq!(backoff_delay(base, 9), Duration::from_secs(40));
    }

    #[test]
    fn jitter_stays_below_bound() {
        assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
        for _ in 0..100 {
            assert!(jitter(Duration::from_millis(250)) < Duration::from_millis(250));
        }
    }
}
