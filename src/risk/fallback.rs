//! Local fallback scorer used when the remote scorer is unreachable
//!
//! Rule-based failure modes first, then a weighted sum of normalised inputs.
//! Only defined for snapshots that carry air/process temperature, speed,
//! torque and wear; turbine ambient readings have no heuristic.

use serde::Serialize;

use crate::types::{Domain, SensorSnapshot};

// Normalisation ranges of the machine-tool telemetry.
const TORQUE_RANGE: (f64, f64) = (3.0, 80.0);
const RPM_RANGE: (f64, f64) = (1100.0, 2900.0);
const WEAR_MAX: f64 = 250.0;
const TEMP_DIFF_MAX: f64 = 12.0;

/// Result of the heuristic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackAssessment {
    pub risk: f64,
    pub label: &'static str,
    pub reason: &'static str,
    /// Process minus air temperature (K)
    pub temp_diff: f64,
    /// Torque × speed
    pub power: f64,
}

struct Inputs {
    air_temp: f64,
    process_temp: f64,
    rpm: f64,
    torque: f64,
    wear: f64,
}

fn inputs(snapshot: &SensorSnapshot) -> Option<Inputs> {
    let (air, process, wear) = match snapshot.domain {
        Domain::Product => ("airTemp", "processTemp", "toolWear"),
        Domain::Generator => ("air_temp", "core_temp", "wear"),
        Domain::Turbine => return None,
    };
    Some(Inputs {
        air_temp: snapshot.get(air)?,
        process_temp: snapshot.get(process)?,
        rpm: snapshot.get("rpm")?,
        torque: snapshot.get("torque")?,
        wear: snapshot.get(wear)?,
    })
}

/// Score a snapshot locally. `None` when the domain has no heuristic.
pub fn assess(snapshot: &SensorSnapshot) -> Option<FallbackAssessment> {
    let i = inputs(snapshot)?;
    let temp_diff = i.process_temp - i.air_temp;
    let power = i.torque * i.rpm;

    let rule = |risk: f64, label: &'static str, reason: &'static str| FallbackAssessment {
        risk,
        label,
        reason,
        temp_diff,
        power,
    };

    if i.torque > 60.0 && i.rpm > 2500.0 {
        return Some(rule(90.0, "Critical", "Power Failure Risk (High Torque & RPM)"));
    }
    if temp_diff > 10.0 {
        return Some(rule(75.0, "Warning", "Heat Dissipation Risk (Temp Gradient > 10K)"));
    }
    if i.wear > 200.0 {
        return Some(rule(80.0, "Critical", "Tool Wear Failure Risk"));
    }

    let norm_torque = (i.torque - TORQUE_RANGE.0) / (TORQUE_RANGE.1 - TORQUE_RANGE.0);
    let norm_rpm = (i.rpm - RPM_RANGE.0) / (RPM_RANGE.1 - RPM_RANGE.0);
    let norm_wear = i.wear / WEAR_MAX;
    let norm_temp = temp_diff.max(0.0) / TEMP_DIFF_MAX;

    let score = 0.4 * norm_torque + 0.2 * norm_rpm + 0.3 * norm_wear + 0.1 * norm_temp;
    let score = score.clamp(0.0, 1.0) * 100.0;

    let (label, reason) = if score > 50.0 {
        ("Caution", "Elevated Sensor Values")
    } else {
        ("Healthy", "System Nominal")
    };
    Some(rule(score.round(), label, reason))
}
