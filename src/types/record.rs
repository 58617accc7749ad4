//! Sensor records (historical playback) and the live sensor snapshot

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CostProfile, Domain};

/// One timestamped telemetry record as served by the history endpoint.
///
/// Only `risk` (0–100, precomputed by the remote model) is interpreted by the
/// engine; every other field is carried through untouched for the render layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub risk: f64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl SensorRecord {
    pub fn new(risk: f64) -> Self {
        Self {
            risk,
            fields: BTreeMap::new(),
        }
    }

    /// Builder used by tests and fixtures.
    pub fn with_field(mut self, key: &str, value: f64) -> Self {
        self.fields.insert(key.to_string(), serde_json::Value::from(value));
        self
    }

    /// Numeric field value, if present.
    pub fn measurement(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(serde_json::Value::as_f64)
    }
}

// ============================================================================
// Measurement layout per domain
// ============================================================================

/// One measurement channel of a domain.
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    /// Key used in history records and in the snapshot
    pub key: &'static str,
    /// Key expected by the remote scorer request body
    pub wire: &'static str,
    /// Value sent when the snapshot has no reading yet
    pub default: f64,
    /// Sent as a rounded integer
    pub integer: bool,
}

const fn m(key: &'static str, wire: &'static str, default: f64, integer: bool) -> Measurement {
    Measurement {
        key,
        wire,
        default,
        integer,
    }
}

const PRODUCT_MEASUREMENTS: &[Measurement] = &[
    m("airTemp", "air_temp", 300.0, false),
    m("processTemp", "proc_temp", 308.0, false),
    m("rpm", "rpm", 1500.0, true),
    m("torque", "torque", 40.0, false),
    m("toolWear", "tool_wear", 0.0, true),
];

const TURBINE_MEASUREMENTS: &[Measurement] = &[
    m("AT", "AT", 20.0, false),
    m("V", "V", 50.0, false),
    m("AP", "AP", 1010.0, false),
    m("RH", "RH", 70.0, false),
];

const GENERATOR_MEASUREMENTS: &[Measurement] = &[
    m("air_temp", "air_temp", 300.0, false),
    m("core_temp", "core_temp", 310.0, false),
    m("rpm", "rpm", 1500.0, false),
    m("torque", "torque", 40.0, false),
    m("wear", "wear", 100.0, false),
];

/// Product quality class sent with every product prediction.
const PRODUCT_QUALITY_TYPE: &str = "M";

impl Domain {
    /// Measurement channels of this domain, in display order.
    pub fn measurements(&self) -> &'static [Measurement] {
        match self {
            Domain::Product => PRODUCT_MEASUREMENTS,
            Domain::Turbine => TURBINE_MEASUREMENTS,
            Domain::Generator => GENERATOR_MEASUREMENTS,
        }
    }

    /// Resolve a field name given either as record key or wire key.
    pub fn measurement(&self, field: &str) -> Option<&'static Measurement> {
        self.measurements()
            .iter()
            .find(|m| m.key == field || m.wire == field)
    }
}

// ============================================================================
// SensorSnapshot
// ============================================================================

/// Current measurement values shown to the operator.
///
/// Filled from the playing record in playback mode, or from slider updates in
/// live-predict mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub domain: Domain,
    pub values: BTreeMap<String, f64>,
}

impl SensorSnapshot {
    /// Snapshot seeded with the domain defaults.
    pub fn defaults(domain: Domain) -> Self {
        let values = domain
            .measurements()
            .iter()
            .map(|m| (m.key.to_string(), m.default))
            .collect();
        Self { domain, values }
    }

    /// Value of a channel, falling back to the domain default.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values
            .get(key)
            .copied()
            .or_else(|| self.domain.measurement(key).map(|m| m.default))
    }

    /// Overwrite one channel. Returns false for fields the domain does not know.
    pub fn set(&mut self, field: &str, value: f64) -> bool {
        match self.domain.measurement(field) {
            Some(m) => {
                self.values.insert(m.key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Copy every known numeric channel from a record.
    pub fn apply_record(&mut self, record: &SensorRecord) {
        for m in self.domain.measurements() {
            if let Some(v) = record.measurement(m.key) {
                self.values.insert(m.key.to_string(), v);
            }
        }
    }

    /// Request body for the threshold / prediction endpoint.
    pub fn to_request_body(&self, costs: &CostProfile) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        if self.domain == Domain::Product {
            body.insert("Type".to_string(), PRODUCT_QUALITY_TYPE.into());
        }
        for m in self.domain.measurements() {
            let v = self.values.get(m.key).copied().unwrap_or(m.default);
            let v = if m.integer {
                serde_json::Value::from(v.round() as i64)
            } else {
                serde_json::Value::from(v)
            };
            body.insert(m.wire.to_string(), v);
        }
        body.insert("cost_fn".to_string(), costs.cost_fn.into());
        body.insert("cost_fp".to_string(), costs.cost_fp.into());
        serde_json::Value::Object(body)
    }
}
