//! Fleet aggregation: entity risks → tiered treemap tree

use crate::config::defaults::FLEET_MIN_LEAF_SIZE;
use crate::types::{FleetCategory, FleetLeaf, FleetTree, RiskTier, RiskTiers};

/// Buckets entity risks into High / Medium / Low using one canonical pair of
/// cut points.
#[derive(Debug, Clone, Copy)]
pub struct FleetAggregator {
    tiers: RiskTiers,
    min_leaf_size: f64,
}

impl Default for FleetAggregator {
    fn default() -> Self {
        Self::new(RiskTiers::default(), FLEET_MIN_LEAF_SIZE)
    }
}

impl FleetAggregator {
    pub fn new(tiers: RiskTiers, min_leaf_size: f64) -> Self {
        Self {
            tiers,
            min_leaf_size,
        }
    }

    /// Build the tree from `(label, risk)` pairs.
    ///
    /// Leaves keep input order within a tier. Empty tiers are omitted and the
    /// rest are ordered High, Medium, Low.
    pub fn aggregate<I, S>(&self, risks: I) -> FleetTree
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut buckets: [Vec<FleetLeaf>; 3] = [Vec::new(), Vec::new(), Vec::new()];

        for (label, risk) in risks {
            let label: String = label.into();
            if !risk.is_finite() {
                tracing::debug!(label = %label, "Skipping non-finite fleet risk");
                continue;
            }
            let slot = match self.tiers.classify(risk) {
                RiskTier::High => 0,
                RiskTier::Medium => 1,
                RiskTier::Low => 2,
            };
            buckets[slot].push(FleetLeaf {
                entity_label: label,
                size: risk.max(self.min_leaf_size),
                probability: round_one_decimal(risk),
            });
        }

        let categories = RiskTier::ORDER
            .into_iter()
            .zip(buckets)
            .filter(|(_, children)| !children.is_empty())
            .map(|(tier, children)| FleetCategory { tier, children })
            .collect();

        FleetTree { categories }
    }
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn three_entities_land_in_three_ordered_tiers() {
        let agg = FleetAggregator::default();
        let tree = agg.aggregate([("A", 85.0), ("B", 55.0), ("C", 10.0)]);

        let tiers: Vec<RiskTier> = tree.categories.iter().map(|c| c.tier).collect();
        assert_eq!(tiers, vec![RiskTier::High, RiskTier::Medium, RiskTier::Low]);
        for cat in &tree.categories {
            assert_eq!(cat.children.len(), 1);
        }
        assert_eq!(tree.categories[0].children[0].size, 85.0);
        assert_eq!(tree.categories[1].children[0].size, 55.0);
        assert_eq!(tree.categories[2].children[0].size, 10.0);
    }

    #[test]
    fn empty_tiers_are_omitted() {
        let agg = FleetAggregator::default();
        let tree = agg.aggregate([("A", 12.0), ("B", 95.0), ("C", 3.0)]);
        assert_eq!(tree.categories.len(), 2);
        assert_eq!(tree.categories[0].tier, RiskTier::High);
        assert_eq!(tree.categories[1].tier, RiskTier::Low);
        let low: Vec<&str> = tree.categories[1]
            .children
            .iter()
            .map(|l| l.entity_label.as_str())
            .collect();
        assert_eq!(low, vec!["A", "C"]);
    }

    #[test]
    fn small_risks_get_minimum_visual_size() {
        let agg = FleetAggregator::default();
        let tree = agg.aggregate([("A", 1.26)]);
        let leaf = &tree.categories[0].children[0];
        assert_eq!(leaf.size, 5.0);
        assert_eq!(leaf.probability, 1.3);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let agg = FleetAggregator::default();
        let tree = agg.aggregate([("H", 70.0), ("M", 40.0)]);
        assert_eq!(tree.category(RiskTier::High).unwrap().children[0].entity_label, "H");
        assert_eq!(tree.category(RiskTier::Medium).unwrap().children[0].entity_label, "M");
    }

    #[test]
    fn flatten_reproduces_rounded_probabilities() {
        let agg = FleetAggregator::default();
        let input: BTreeMap<String, f64> = [
            ("Turbine_1".to_string(), 91.24),
            ("Turbine_2".to_string(), 47.05),
            ("Turbine_3".to_string(), 0.0),
            ("Turbine_4".to_string(), 69.96),
        ]
        .into_iter()
        .collect();

        let tree = agg.aggregate(input.clone());
        let flat = tree.flatten();

        assert_eq!(flat.len(), input.len());
        for (label, risk) in &input {
            assert_eq!(flat[label], (risk * 10.0).round() / 10.0);
        }
    }

    #[test]
    fn empty_input_gives_empty_tree() {
        let agg = FleetAggregator::default();
        let tree = agg.aggregate(Vec::<(String, f64)>::new());
        assert!(tree.is_empty());
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            serde_json::json!([])
        );
    }

    #[test]
    fn tree_serializes_in_treemap_shape() {
        let agg = FleetAggregator::default();
        let tree = agg.aggregate([("Generator_2", 77.0)]);
        let v = serde_json::to_value(&tree).unwrap();
        assert_eq!(v[0]["name"], "High Risk");
        assert_eq!(v[0]["children"][0]["name"], "Generator_2");
        assert_eq!(v[0]["children"][0]["prob"], 77.0);
    }
}
