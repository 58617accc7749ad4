//! Entity identity and equipment domains

use serde::{Deserialize, Serialize};

// ============================================================================
// EntityId
// ============================================================================

/// Opaque identifier of one monitored unit (product, turbine or generator).
///
/// The remote service uses bare integers for products and integer suffixes for
/// turbines/generators, but nothing here depends on the id being numeric.
///
/// Digit-only strings are numeric ids on every input path, so `"5"` and `5`
/// name the same unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged, from = "RawEntityId")]
pub enum EntityId {
    Numeric(u64),
    Named(String),
}

/// Wire shape before digit strings are normalized.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntityId {
    Numeric(u64),
    Named(String),
}

impl From<RawEntityId> for EntityId {
    fn from(raw: RawEntityId) -> Self {
        match raw {
            RawEntityId::Numeric(n) => EntityId::Numeric(n),
            RawEntityId::Named(s) => EntityId::from(s.as_str()),
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Numeric(n) => write!(f, "{}", n),
            EntityId::Named(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        EntityId::Numeric(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        s.parse::<u64>()
            .map_or_else(|_| EntityId::Named(s.to_string()), EntityId::Numeric)
    }
}

impl std::str::FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EntityId::from(s.trim()))
    }
}

// ============================================================================
// Domain
// ============================================================================

/// Equipment family served by one remote endpoint family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Machine tools (AI4I-style telemetry)
    #[default]
    Product,
    /// Wind/gas turbines (ambient conditions telemetry)
    Turbine,
    /// Generators (temperature, speed, torque, wear)
    Generator,
}

impl Domain {
    /// Label prefix used in fleet trees and multi-entity trend keys.
    pub fn prefix(&self) -> &'static str {
        match self {
            Domain::Product => "Product",
            Domain::Turbine => "Turbine",
            Domain::Generator => "Generator",
        }
    }

    /// Display label for an entity, e.g. `Turbine_3`.
    ///
    /// Ids that already carry the prefix are returned unchanged.
    pub fn label(&self, id: &EntityId) -> String {
        let raw = id.to_string();
        let prefix = format!("{}_", self.prefix());
        if raw.starts_with(&prefix) {
            raw
        } else {
            format!("{}{}", prefix, raw)
        }
    }

    /// Path of the history endpoint for one entity.
    pub fn history_path(&self, id: &EntityId) -> String {
        match self {
            Domain::Product => format!("/product/{}", id),
            Domain::Turbine => format!("/turbine/{}", self.label(id)),
            Domain::Generator => format!("/generator/{}", self.label(id)),
        }
    }

    /// Path of the fleet-status endpoint.
    pub fn fleet_status_path(&self) -> &'static str {
        match self {
            Domain::Product => "/fleet/status",
            Domain::Turbine => "/turbine/fleet/status",
            Domain::Generator => "/generator/fleet/status",
        }
    }

    /// Path of the threshold optimisation / prediction endpoint.
    pub fn threshold_path(&self) -> &'static str {
        match self {
            Domain::Product => "/predict",
            Domain::Turbine => "/turbine/predict/cost",
            Domain::Generator => "/generator/predict/cost",
        }
    }

    /// Whether the fleet endpoint needs an explicit, non-empty id list.
    ///
    /// Turbine and generator endpoints report the whole fleet.
    pub fn fleet_requires_selection(&self) -> bool {
        matches!(self, Domain::Product)
    }

    /// Default playback tick interval (ms).
    pub fn default_tick_interval_ms(&self) -> u64 {
        match self {
            Domain::Product => 1_000,
            Domain::Turbine | Domain::Generator => 3_000,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Domain::Product => write!(f, "product"),
            Domain::Turbine => write!(f, "turbine"),
            Domain::Generator => write!(f, "generator"),
        }
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" | "products" | "equipment" => Ok(Domain::Product),
            "turbine" | "turbines" => Ok(Domain::Turbine),
            "generator" | "generators" => Ok(Domain::Generator),
            other => Err(format!("unknown domain '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_parses_numeric_strings() {
        assert_eq!(EntityId::from("7"), EntityId::Numeric(7));
        assert_eq!(EntityId::from("T-7"), EntityId::Named("T-7".to_string()));
    }

    #[test]
    fn entity_id_deserializes_both_shapes() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"[3, "Turbine_4"]"#).unwrap();
        assert_eq!(ids[0], EntityId::Numeric(3));
        assert_eq!(ids[1], EntityId::Named("Turbine_4".to_string()));
    }

    #[test]
    fn digit_strings_deserialize_as_numbers() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"[5, "5"]"#).unwrap();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[1], EntityId::Numeric(5));
        assert_eq!(serde_json::to_string(&ids[1]).unwrap(), "5");
    }

    #[test]
    fn labels_do_not_double_prefix() {
        assert_eq!(Domain::Turbine.label(&EntityId::from(3)), "Turbine_3");
        assert_eq!(Domain::Turbine.label(&EntityId::from("Turbine_3")), "Turbine_3");
        assert_eq!(Domain::Product.label(&EntityId::from(5)), "Product_5");
    }

    #[test]
    fn endpoint_paths_per_domain() {
        let id = EntityId::from(2);
        assert_eq!(Domain::Product.history_path(&id), "/product/2");
        assert_eq!(Domain::Turbine.history_path(&id), "/turbine/Turbine_2");
        assert_eq!(Domain::Generator.history_path(&id), "/generator/Generator_2");
        assert_eq!(Domain::Generator.threshold_path(), "/generator/predict/cost");
    }

    #[test]
    fn domain_from_str() {
        assert_eq!("Turbine".parse::<Domain>().unwrap(), Domain::Turbine);
        assert!("boiler".parse::<Domain>().is_err());
    }
}
