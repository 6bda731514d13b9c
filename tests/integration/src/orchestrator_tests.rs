//! Orchestrator fallback and health scenario tests

use crate::mock_providers::*;
use orchestrator_resilience::{CircuitBreakerConfig, ProviderHealth};
use orchestrator_routing::{CallOptions, Orchestrator};
use pretty_assertions::assert_eq;
use std::time::Duration;

/// With the priority-1 provider's breaker forced open, the response comes
/// from the priority-2 provider and the blocked adapter is never invoked
#[tokio::test]
async fn test_fallback_skips_breaker_open_provider() {
    let orchestrator = Orchestrator::new();
    let primary = MockProvider::new("primary", MockBehavior::Fail("down".into()));
    let secondary = MockProvider::new("secondary", MockBehavior::Succeed("from backup".into()));

    orchestrator
        .register_provider(primary.clone(), test_config("primary", 1))
        .expect("register");
    orchestrator
        .register_provider(secondary.clone(), test_config("secondary", 2))
        .expect("register");

    // Force five failures to open the primary's breaker (default threshold)
    for _ in 0..5 {
        orchestrator.call("q", CallOptions::default()).await;
    }
    let primary_calls = primary.calls();
    assert_eq!(primary_calls, 5);

    let response = orchestrator.call("q", CallOptions::default()).await;
    assert!(response.success);
    assert_eq!(response.provider_name, "secondary");
    assert_eq!(response.content, "from backup");
    // Primary's adapter not invoked for this call
    assert_eq!(primary.calls(), primary_calls);
}

/// Fresh health scores 1.0; one failure keeps the provider healthy; five
/// consecutive failures mark it unhealthy
#[test]
fn test_health_score_progression() {
    let health = ProviderHealth::new("p", 0, true);
    assert!((health.health_score() - 1.0).abs() < f64::EPSILON);

    health.update_failure();
    assert_eq!(health.snapshot().consecutive_failures, 1);
    assert!(health.is_healthy());

    for _ in 0..4 {
        health.update_failure();
    }
    assert!(!health.is_healthy());
}

/// A provider with quota configured and zero remaining fails both the quota
/// check and the health check regardless of its other metrics
#[test]
fn test_quota_exhaustion_overrides_health() {
    let health = ProviderHealth::new("p", 100, true);
    health.update_success(Duration::from_millis(50));
    assert!(health.is_healthy());

    health.update_quota_remaining(0.0);
    assert!(!health.check_quota());
    assert!(!health.is_healthy());
}

/// With every breaker forced open the orchestrator returns a synthetic
/// failure without attempting any network call
#[tokio::test]
async fn test_full_exhaustion_returns_synthetic_failure() {
    let orchestrator = Orchestrator::new();
    let a = MockProvider::new("a", MockBehavior::Fail("down".into()));
    let b = MockProvider::new("b", MockBehavior::Fail("down".into()));

    let trip_fast = CircuitBreakerConfig {
        failure_threshold: 1,
        ..Default::default()
    };
    orchestrator
        .register_provider_with_breaker(a.clone(), test_config("a", 1), trip_fast.clone())
        .expect("register");
    orchestrator
        .register_provider_with_breaker(b.clone(), test_config("b", 2), trip_fast)
        .expect("register");

    // One failing pass trips both breakers
    orchestrator.call("x", CallOptions::default()).await;
    let calls_after_trip = (a.calls(), b.calls());

    let response = orchestrator.call("x", CallOptions::default()).await;
    assert!(!response.success);
    assert_eq!(response.provider_name, "none");
    assert!(response.error.is_some());
    // No adapter was touched
    assert_eq!((a.calls(), b.calls()), calls_after_trip);
}

/// Same-priority providers are attempted in registration order
#[tokio::test]
async fn test_tie_break_by_registration_order() {
    let orchestrator = Orchestrator::new();
    let first = MockProvider::new("first", MockBehavior::Succeed("one".into()));
    let second = MockProvider::new("second", MockBehavior::Succeed("two".into()));

    orchestrator
        .register_provider(first.clone(), test_config("first", 3))
        .expect("register");
    orchestrator
        .register_provider(second.clone(), test_config("second", 3))
        .expect("register");

    let response = orchestrator.call("q", CallOptions::default()).await;
    assert_eq!(response.provider_name, "first");
    assert_eq!(second.calls(), 0);
}

/// Latency measured around the adapter lands on the response and in the
/// provider's health tracker
#[tokio::test]
async fn test_latency_is_tracked() {
    let orchestrator = Orchestrator::new();
    let slow = MockProvider::new(
        "slow",
        MockBehavior::SucceedAfter(Duration::from_millis(50)),
    );
    orchestrator
        .register_provider(slow, test_config("slow", 1))
        .expect("register");

    let response = orchestrator.call("q", CallOptions::default()).await;
    assert!(response.success);
    assert!(response.response_time >= 0.05);

    let health = orchestrator.get_provider_status("slow").expect("status").health;
    assert!(health.avg_latency_secs >= 0.05);
    assert_eq!(health.success_count, 1);
}

/// The exhaustion response carries the attempt count and last error for
/// caller-side diagnostics
#[tokio::test]
async fn test_exhaustion_metadata() {
    let orchestrator = Orchestrator::new();
    orchestrator
        .register_provider(
            MockProvider::new("a", MockBehavior::Fail("first error".into())),
            test_config("a", 1),
        )
        .expect("register");
    orchestrator
        .register_provider(
            MockProvider::new("b", MockBehavior::SoftFail("second error".into())),
            test_config("b", 2),
        )
        .expect("register");

    let response = orchestrator.call("x", CallOptions::default()).await;
    assert!(!response.success);
    assert_eq!(response.metadata["attempts"], serde_json::json!(2));
    assert_eq!(response.metadata["last_error"], serde_json::json!("second error"));
}
