//! Risk tiers, cost profile and the current risk analysis

use serde::{Deserialize, Serialize};

use crate::config::defaults::{DEFAULT_COST_FN, DEFAULT_COST_FP, DEFAULT_DECISION_THRESHOLD};

// ============================================================================
// Risk tiers
// ============================================================================

/// Risk category of an entity, ordered High → Medium → Low.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskTier {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "Low Risk")]
    Low,
}

impl RiskTier {
    /// Tiers in treemap order.
    pub const ORDER: [RiskTier; 3] = [RiskTier::High, RiskTier::Medium, RiskTier::Low];

    /// Category name shown on the treemap.
    pub fn category_name(&self) -> &'static str {
        match self {
            RiskTier::High => "High Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::Low => "Low Risk",
        }
    }

    /// Operator-facing status for a playing entity.
    pub fn status(&self) -> &'static str {
        match self {
            RiskTier::High => "Critical",
            RiskTier::Medium => "Warning",
            RiskTier::Low => "Normal",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.category_name())
    }
}

/// The one canonical pair of tier cut points (inclusive lower bounds, 0–100).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskTiers {
    /// `risk >= high` is High
    #[serde(default = "default_high")]
    pub high: f64,
    /// `risk >= medium` is Medium
    #[serde(default = "default_medium")]
    pub medium: f64,
}

fn default_high() -> f64 {
    70.0
}

fn default_medium() -> f64 {
    40.0
}

impl Default for RiskTiers {
    fn default() -> Self {
        Self {
            high: default_high(),
            medium: default_medium(),
        }
    }
}

impl RiskTiers {
    pub fn classify(&self, risk: f64) -> RiskTier {
        if risk >= self.high {
            RiskTier::High
        } else if risk >= self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

// ============================================================================
// Cost profile
// ============================================================================

/// Which side of the cost profile an update targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CostField {
    /// Cost of a missed failure (false negative)
    CostFn,
    /// Cost of a false alarm (false positive)
    CostFp,
}

impl CostField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostField::CostFn => "cost_fn",
            CostField::CostFp => "cost_fp",
        }
    }
}

impl std::str::FromStr for CostField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cost_fn" => Ok(CostField::CostFn),
            "cost_fp" => Ok(CostField::CostFp),
            other => Err(format!("unknown cost field '{}'", other)),
        }
    }
}

/// Asymmetric business costs used to pick the decision threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostProfile {
    pub cost_fn: f64,
    pub cost_fp: f64,
}

impl Default for CostProfile {
    fn default() -> Self {
        Self {
            cost_fn: DEFAULT_COST_FN,
            cost_fp: DEFAULT_COST_FP,
        }
    }
}

impl CostProfile {
    pub fn set(&mut self, field: CostField, value: f64) {
        match field {
            CostField::CostFn => self.cost_fn = value,
            CostField::CostFp => self.cost_fp = value,
        }
    }

    pub fn get(&self, field: CostField) -> f64 {
        match field {
            CostField::CostFn => self.cost_fn,
            CostField::CostFp => self.cost_fp,
        }
    }
}

// ============================================================================
// Optimisation diagnostics
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Thresholds the scorer computed with alternative selection methods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MethodThresholds {
    #[serde(default)]
    pub cost_sensitive: Option<f64>,
    #[serde(default)]
    pub youden_j: Option<f64>,
    #[serde(default)]
    pub f_beta: Option<f64>,
    #[serde(default)]
    pub pr_breakeven: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OptimizationDiagnostics {
    #[serde(default)]
    pub annual_savings_estimate: Option<f64>,
    #[serde(default)]
    pub confidence_interval: Option<ConfidenceInterval>,
    #[serde(default)]
    pub method_thresholds: Option<MethodThresholds>,
}

// ============================================================================
// Risk analysis
// ============================================================================

/// Best-known risk picture for the operator.
///
/// Replaced wholesale by each writer; never merged field by field from two
/// concurrent sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAnalysis {
    /// Displayed risk, 0–100
    pub risk: f64,
    pub label: String,
    pub reason: String,
    /// Decision threshold (probability, 0–1)
    pub threshold: f64,
    pub strategy: Option<String>,
    pub optimization: Option<OptimizationDiagnostics>,
    pub is_optimizing: bool,
}

impl Default for RiskAnalysis {
    fn default() -> Self {
        Self {
            risk: 0.0,
            label: "Normal".to_string(),
            reason: "System Nominal".to_string(),
            threshold: DEFAULT_DECISION_THRESHOLD,
            strategy: None,
            optimization: None,
            is_optimizing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_tiers_are_inclusive() {
        let tiers = RiskTiers::default();
        assert_eq!(tiers.classify(70.0), RiskTier::High);
        assert_eq!(tiers.classify(69.9), RiskTier::Medium);
        assert_eq!(tiers.classify(40.0), RiskTier::Medium);
        assert_eq!(tiers.classify(39.9), RiskTier::Low);
        assert_eq!(tiers.classify(0.0), RiskTier::Low);
    }

    #[test]
    fn tier_serializes_as_category_name() {
        assert_eq!(
            serde_json::to_value(RiskTier::Medium).unwrap(),
            serde_json::json!("Medium Risk")
        );
    }

    #[test]
    fn cost_profile_set_and_get() {
        let mut costs = CostProfile::default();
        costs.set(CostField::CostFp, 750.0);
        assert_eq!(costs.get(CostField::CostFp), 750.0);
        assert_eq!(costs.get(CostField::CostFn), DEFAULT_COST_FN);
        assert!("cost_xx".parse::<CostField>().is_err());
    }

    #[test]
    fn diagnostics_tolerate_partial_payloads() {
        let d: OptimizationDiagnostics =
            serde_json::from_str(r#"{"annual_savings_estimate": 1200.5}"#).unwrap();
        assert_eq!(d.annual_savings_estimate, Some(1200.5));
        assert!(d.method_thresholds.is_none());
    }
}
