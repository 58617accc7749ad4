//! Shared data structures for the playback and risk-state engine
//!
//! - `EntityId` / `Domain`: what is monitored and which endpoint family serves it
//! - `SensorRecord` / `SensorSnapshot`: historical records and the live reading
//! - `RiskAnalysis` / `CostProfile`: what the operator sees and tunes
//! - `FleetTree`: tiered grouping for the treemap

mod analysis;
mod entity;
mod fleet;
mod record;

pub use analysis::*;
pub use entity::*;
pub use fleet::*;
pub use record::*;
