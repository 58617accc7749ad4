//! Cost-threshold optimisation and live prediction
//!
//! Timing-sensitive cases run on a paused clock so debounce and timeouts are
//! exercised deterministically.

mod common;

use common::{config, ids, session, session_with, FakeScorer};
use fleetwatch::remote::ThresholdResponse;
use fleetwatch::session::LogKind;
use fleetwatch::{CostField, Domain, SessionError};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Debounced optimisation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rapid_cost_changes_collapse_into_one_request() {
    let scorer = FakeScorer::new();
    let s = session(Domain::Turbine, &scorer);

    for step in 0..10 {
        assert_ok!(s.update_cost(CostField::CostFn, 1_000.0 + f64::from(step)).await);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let snap = s.snapshot().await;
    assert!(snap.analysis.is_optimizing);
    assert_eq!(snap.costs.cost_fn, 1_009.0);

    tokio::time::sleep(Duration::from_secs(1)).await;

    let calls = scorer.threshold_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.cost_fn, 1_009.0);
    assert_eq!(calls[0].1.cost_fp, 500.0);

    let snap = s.snapshot().await;
    assert!(!snap.analysis.is_optimizing);
    assert!((snap.analysis.threshold - 500.0 / 1_509.0).abs() < 1e-12);
    assert_eq!(snap.analysis.strategy.as_deref(), Some("cost_sensitive"));
    assert_eq!(snap.logs[0].message, "Threshold optimized: 0.3313 (cost_sensitive)");
}

#[tokio::test(start_paused = true)]
async fn in_flight_request_is_superseded() {
    let scorer = FakeScorer::new();
    scorer.push_threshold_delay(Duration::from_secs(2));
    let s = session(Domain::Generator, &scorer);

    s.update_cost(CostField::CostFp, 800.0).await.unwrap();
    // Past the debounce, first request now waiting on the scorer
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(scorer.threshold_calls().len(), 1);

    s.update_cost(CostField::CostFp, 900.0).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let calls = scorer.threshold_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].1.cost_fp, 900.0);

    let snap = s.snapshot().await;
    assert_eq!(snap.logs.len(), 1);
    assert_eq!(snap.logs[0].message, "Threshold optimized: 0.1525 (cost_sensitive)");
    assert!((snap.analysis.threshold - 900.0 / 5_900.0).abs() < 1e-12);
}

#[tokio::test(start_paused = true)]
async fn failed_optimisation_keeps_threshold() {
    let scorer = FakeScorer::new();
    scorer.set_offline(true);
    let s = session(Domain::Turbine, &scorer);
    let before = s.snapshot().await.analysis.threshold;

    s.update_cost(CostField::CostFn, 7_500.0).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let snap = s.snapshot().await;
    assert_eq!(scorer.threshold_calls().len(), 1);
    assert_eq!(snap.analysis.threshold, before);
    assert!(!snap.analysis.is_optimizing);
    // The cost itself is kept
    assert_eq!(snap.costs.cost_fn, 7_500.0);
    assert!(snap.logs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_scorer_times_out() {
    let scorer = FakeScorer::new();
    scorer.push_threshold_delay(Duration::from_secs(60));
    let mut cfg = config(Domain::Generator);
    cfg.remote.request_timeout_ms = 2_000;
    let s = session_with(&cfg, &scorer);

    s.update_cost(CostField::CostFn, 6_000.0).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let snap = s.snapshot().await;
    assert!(!snap.analysis.is_optimizing);
    assert_eq!(snap.analysis.threshold, 0.5);
}

#[tokio::test]
async fn invalid_cost_is_rejected() {
    let scorer = FakeScorer::new();
    let s = session(Domain::Turbine, &scorer);

    let err = assert_err!(s.update_cost(CostField::CostFn, -1.0).await);
    assert!(matches!(err, SessionError::InvalidValue { ref field, .. } if field == "cost_fn"));
    assert_err!(s.update_cost(CostField::CostFp, f64::NAN).await);
    assert!(!s.snapshot().await.analysis.is_optimizing);
}

// ============================================================================
// Live prediction
// ============================================================================

#[tokio::test]
async fn live_prediction_updates_analysis() {
    let scorer = FakeScorer::new();
    let s = session(Domain::Product, &scorer);

    assert_ok!(s.update_sensor("torque", 70.0).await);

    let snap = s.snapshot().await;
    assert_eq!(snap.sensors["torque"], 70.0);
    assert_eq!(snap.analysis.risk, 70.0);
    assert!((snap.analysis.threshold - 500.0 / 5_500.0).abs() < 1e-12);
    assert_eq!(snap.single_history.len(), 1);
    assert_eq!(snap.logs[0].message, "High Risk Warning");
    assert_eq!(snap.logs[0].kind, LogKind::Warning);

    let (sent, _) = &scorer.threshold_calls()[0];
    assert_eq!(sent.get("torque"), Some(70.0));
}

#[tokio::test]
async fn predicted_failure_logs_danger_once() {
    let scorer = FakeScorer::new();
    scorer.set_prediction(ThresholdResponse {
        probability: Some(0.912),
        status: Some("Failure Predicted".to_string()),
        recommendation: Some("Replace tool before next shift".to_string()),
        prediction: Some(1),
        ..ThresholdResponse::with_threshold(0.42)
    });
    let s = session(Domain::Product, &scorer);

    s.update_sensor("rpm", 2_800.0).await.unwrap();
    s.update_sensor("rpm", 2_850.0).await.unwrap();

    let snap = s.snapshot().await;
    assert_eq!(snap.analysis.risk, 91.0);
    assert_eq!(snap.analysis.label, "Failure Predicted");
    assert_eq!(snap.analysis.reason, "Replace tool before next shift");
    assert_eq!(snap.logs.len(), 1);
    assert_eq!(snap.logs[0].kind, LogKind::Danger);
    assert_eq!(snap.single_history.len(), 2);
}

#[tokio::test]
async fn unreachable_scorer_falls_back_to_heuristic() {
    let scorer = FakeScorer::new();
    scorer.set_offline(true);
    let s = session(Domain::Product, &scorer);

    // Wire key resolves to the same channel
    s.update_sensor("tool_wear", 220.0).await.unwrap();

    let snap = s.snapshot().await;
    assert_eq!(snap.sensors["toolWear"], 220.0);
    assert_eq!(snap.analysis.risk, 80.0);
    assert_eq!(snap.analysis.label, "Critical");
    assert_eq!(snap.analysis.reason, "Tool Wear Failure Risk");
}

#[tokio::test]
async fn turbine_keeps_analysis_when_offline() {
    let scorer = FakeScorer::new();
    scorer.set_offline(true);
    let s = session(Domain::Turbine, &scorer);

    s.update_sensor("AT", 35.0).await.unwrap();

    let snap = s.snapshot().await;
    assert_eq!(snap.sensors["AT"], 35.0);
    assert_eq!(snap.analysis.risk, 0.0);
    assert!(snap.single_history.is_empty());
}

#[tokio::test]
async fn sensor_updates_are_rejected_during_playback() {
    let scorer = FakeScorer::new();
    scorer.with_history(1, &[20.0]);
    let s = session(Domain::Product, &scorer);
    s.select(ids(&[1])).await;

    let err = assert_err!(s.update_sensor("torque", 50.0).await);
    assert!(matches!(err, SessionError::PlaybackActive));
    assert!(scorer.threshold_calls().is_empty());
}

#[tokio::test]
async fn unknown_sensor_field_is_rejected() {
    let scorer = FakeScorer::new();
    let s = session(Domain::Generator, &scorer);

    let err = assert_err!(s.update_sensor("humidity", 10.0).await);
    assert!(matches!(err, SessionError::UnknownField(ref f) if f == "humidity"));
    assert!(scorer.threshold_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn newer_sensor_update_wins() {
    let scorer = FakeScorer::new();
    scorer.push_threshold_delay(Duration::from_millis(500));
    let s = session(Domain::Product, &scorer);

    let slow = {
        let s = s.clone();
        tokio::spawn(async move { s.update_sensor("torque", 70.0).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    s.update_sensor("torque", 30.0).await.unwrap();
    assert_ok!(slow.await.unwrap());

    let snap = s.snapshot().await;
    assert_eq!(snap.analysis.risk, 30.0);
    assert_eq!(snap.single_history.len(), 1);
    assert!(snap.logs.is_empty());
}
