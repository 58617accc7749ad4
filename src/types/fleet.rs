//! Fleet tree: risk tier → entities, sized for treemap rendering

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::RiskTier;

/// One entity inside a tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetLeaf {
    #[serde(rename = "name")]
    pub entity_label: String,
    /// Visual weight, floored so tiny risks stay clickable
    pub size: f64,
    /// Risk rounded to one decimal
    #[serde(rename = "prob")]
    pub probability: f64,
}

/// One tier node with at least one leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetCategory {
    #[serde(rename = "name")]
    pub tier: RiskTier,
    pub children: Vec<FleetLeaf>,
}

/// Root of the fleet grouping. Serializes as the bare category array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct FleetTree {
    pub categories: Vec<FleetCategory>,
}

impl FleetTree {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of leaves across all tiers.
    pub fn leaf_count(&self) -> usize {
        self.categories.iter().map(|c| c.children.len()).sum()
    }

    pub fn category(&self, tier: RiskTier) -> Option<&FleetCategory> {
        self.categories.iter().find(|c| c.tier == tier)
    }

    /// Flatten back to `label → probability`.
    pub fn flatten(&self) -> BTreeMap<String, f64> {
        self.categories
            .iter()
            .flat_map(|c| c.children.iter())
            .map(|leaf| (leaf.entity_label.clone(), leaf.probability))
            .collect()
    }
}
