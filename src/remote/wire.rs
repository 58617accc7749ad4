//! Response shapes of the remote endpoint families
//!
//! The three domains grew their endpoints independently, so the same logical
//! payload arrives in different envelopes. Everything is normalised here.

use serde::Deserialize;
use serde_json::Value;

use super::FleetReading;
use crate::types::{Domain, EntityId, SensorRecord};

/// History payload: bare array (product) or `{history: [...]}` (turbine/generator).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HistoryPayload {
    Bare(Vec<SensorRecord>),
    Wrapped { history: Vec<SensorRecord> },
}

impl HistoryPayload {
    pub fn into_records(self) -> Vec<SensorRecord> {
        match self {
            HistoryPayload::Bare(records) | HistoryPayload::Wrapped { history: records } => records,
        }
    }
}

/// Fleet payload: `{fleet: [{turbine_id, risk}]}` or a pre-bucketed tree.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FleetPayload {
    Wrapped { fleet: Vec<FleetEntry> },
    Tree(Vec<RawCategory>),
}

#[derive(Debug, Deserialize)]
pub struct FleetEntry {
    #[serde(alias = "turbine_id", alias = "generator_id", alias = "product_id", alias = "name")]
    pub id: Value,
    pub risk: f64,
}

/// Server-side tier node of the product fleet tree.
///
/// The server's tier name is ignored; leaves are re-bucketed with the
/// canonical tiers.
#[derive(Debug, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub children: Vec<RawLeaf>,
}

/// Product leaf: one record, `prob` is a 0–1 fraction.
#[derive(Debug, Deserialize)]
pub struct RawLeaf {
    pub name: Value,
    #[serde(default)]
    pub product: Option<String>,
    pub prob: f64,
}

fn value_label(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl FleetPayload {
    pub fn into_readings(self) -> Vec<FleetReading> {
        match self {
            FleetPayload::Wrapped { fleet } => fleet
                .into_iter()
                .map(|e| FleetReading {
                    label: value_label(&e.id),
                    risk: e.risk,
                })
                .collect(),
            FleetPayload::Tree(categories) => categories
                .into_iter()
                .flat_map(|c| c.children)
                .map(|leaf| {
                    let record = value_label(&leaf.name);
                    let label = match leaf.product {
                        Some(product) => format!("{} #{}", product, record),
                        None => record,
                    };
                    FleetReading {
                        label,
                        risk: leaf.prob * 100.0,
                    }
                })
                .collect(),
        }
    }
}

/// Request body of the fleet-status endpoint.
pub fn fleet_request_body(domain: Domain, ids: &[EntityId]) -> Value {
    match domain {
        Domain::Product => serde_json::json!({ "product_ids": ids }),
        Domain::Turbine | Domain::Generator => {
            Value::Array(ids.iter().map(|id| Value::String(domain.label(id))).collect())
        }
    }
}
