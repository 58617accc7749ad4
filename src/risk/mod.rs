//! Risk transforms between the model output and the operator display
//!
//! - [`RiskSuppressor`]: counter-driven duty-cycle distortion per entity
//! - [`FleetAggregator`]: tiered treemap grouping of entity risks
//! - [`fallback`]: local heuristic when the remote scorer is unreachable

mod aggregator;
pub mod fallback;
mod suppressor;

pub use aggregator::FleetAggregator;
pub use fallback::FallbackAssessment;
pub use suppressor::RiskSuppressor;
