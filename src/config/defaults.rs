//! System-wide default constants.
//!
//! Centralises the magic numbers of the playback engine.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Playback
// ============================================================================

/// Capacity of the single- and multi-entity trend buffers (points).
pub const HISTORY_BUFFER_CAPACITY: usize = 50;

/// Cursor stride in multi-entity mode.
///
/// Every 3rd record is shown so several entities cover a longer apparent timeline.
pub const MULTI_SAMPLE_INTERVAL: usize = 3;

/// Cursor stride in single-entity mode.
pub const SINGLE_STEP: usize = 1;

// ============================================================================
// Risk suppression
// ============================================================================

/// Actual risk at or below this value is shown unchanged.
pub const SUPPRESSION_FLOOR: f64 = 40.0;

/// Every Nth qualifying sample reveals the actual value.
pub const SUPPRESSION_REVEAL_EVERY: u64 = 5;

/// Divisor applied to hidden samples.
pub const SUPPRESSION_DIVISOR: f64 = 4.0;

// ============================================================================
// Fleet
// ============================================================================

/// Minimum treemap leaf size.
pub const FLEET_MIN_LEAF_SIZE: f64 = 5.0;

/// Interval between fleet-status refreshes (ms).
pub const FLEET_REFRESH_INTERVAL_MS: u64 = 5_000;

/// Random jitter added to the refresh interval (ms).
pub const FLEET_REFRESH_JITTER_MS: u64 = 250;

/// Cap on the exponential backoff after failed refreshes (2^n).
pub const FLEET_REFRESH_MAX_BACKOFF_EXPONENT: u32 = 3;

// ============================================================================
// Cost optimiser
// ============================================================================

/// Quiet period before a cost change is sent to the scorer (ms).
pub const COST_DEBOUNCE_MS: u64 = 300;

/// Default cost of a missed failure.
pub const DEFAULT_COST_FN: f64 = 5_000.0;

/// Default cost of a false alarm.
pub const DEFAULT_COST_FP: f64 = 500.0;

/// Decision threshold shown before the first optimisation.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

// ============================================================================
// Remote scorer
// ============================================================================

/// Default base URL of the remote scorer.
pub const DEFAULT_REMOTE_BASE_URL: &str = "http://localhost:8000";

/// Upper bound on any single remote call (ms).
pub const REMOTE_REQUEST_TIMEOUT_MS: u64 = 8_000;

// ============================================================================
// Operator log feed
// ============================================================================

/// Maximum entries kept in the log feed.
pub const LOG_FEED_CAPACITY: usize = 50;

/// Identical consecutive live-predict messages within this window are collapsed (ms).
pub const LOG_DEDUP_WINDOW_MS: i64 = 5_000;

/// Live-predict probability above which a warning is logged.
pub const LIVE_WARNING_PROBABILITY: f64 = 0.5;

// ============================================================================
// Server
// ============================================================================

/// Default bind address of the snapshot API.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
