//! Tests for admission control

use narayana_competency::{
    ActivationRequest, AdmissionController, CompetencyContext, CompetencyEngine, CompetencyError,
    CompetencyModule, EventKind, ResourceUsage, ScalabilityConfig, Severity,
};
use std::sync::Arc;
use std::thread;

fn small_config() -> ScalabilityConfig {
    ScalabilityConfig {
        max_concurrent_competencies: 2,
        memory_limit_mb: 100.0,
        cpu_limit_percent: 25.0,
        network_limit_mbps: 10.0,
        ..Default::default()
    }
}

fn request(id: &str, resources: ResourceUsage) -> ActivationRequest {
    ActivationRequest::new(id, CompetencyContext::new("user-1", "check-in")).with_resources(resources)
}

fn register(engine: &CompetencyEngine, id: &str, domain: &str) {
    engine
        .register_competency(CompetencyModule::new(id, id, domain))
        .unwrap();
}

#[test]
fn test_budget_is_limit_times_concurrency() {
    let config = small_config();
    assert_eq!(config.total_budget(), ResourceUsage::new(200.0, 50.0, 20.0));
}

#[test]
fn test_check_admits_within_budget() {
    let config = small_config();
    let decision = AdmissionController::check(
        &config,
        &ResourceUsage::new(100.0, 20.0, 5.0),
        1,
        &ResourceUsage::new(100.0, 30.0, 15.0),
    );
    assert!(decision.admitted);
    assert!(decision.reasons.is_empty());
    assert_eq!(decision.projected, ResourceUsage::new(200.0, 50.0, 20.0));
}

#[test]
fn test_check_rejects_each_dimension_independently() {
    let config = small_config();

    let cpu = AdmissionController::check(
        &config,
        &ResourceUsage::zero(),
        0,
        &ResourceUsage::new(1.0, 51.0, 1.0),
    );
    assert!(!cpu.admitted);
    assert_eq!(cpu.reasons.len(), 1);
    assert!(cpu.reasons[0].starts_with("cpu"));

    let network = AdmissionController::check(
        &config,
        &ResourceUsage::new(0.0, 0.0, 15.0),
        1,
        &ResourceUsage::new(0.0, 0.0, 5.5),
    );
    assert!(!network.admitted);
    assert!(network.reasons[0].starts_with("network"));
}

#[test]
fn test_check_rejects_full_active_set() {
    let config = small_config();
    let decision =
        AdmissionController::check(&config, &ResourceUsage::zero(), 2, &ResourceUsage::zero());
    assert!(!decision.admitted);
    assert!(decision.reasons[0].contains("full"));
}

#[test]
fn test_over_budget_activation_fails() {
    let engine = CompetencyEngine::new(small_config()).unwrap();
    register(&engine, "video_analysis", "vision");

    let response = engine.activate_competency(request(
        "video_analysis",
        ResourceUsage::new(4096.0, 10.0, 1.0),
    ));

    assert!(!response.success);
    assert!(!response.activated);
    assert_eq!(response.error.as_deref(), Some("Insufficient resources"));
    assert!(matches!(
        response.cause,
        Some(CompetencyError::ResourceExhausted(ref reason)) if reason.starts_with("memory")
    ));
    assert_eq!(response.resource_usage, ResourceUsage::zero());
    assert!(engine.get_active_competencies().is_empty());

    let last = engine.get_event_history().pop().unwrap();
    assert_eq!(last.kind, EventKind::ResourceLimitExceeded);
    assert_eq!(last.severity, Severity::Warning);
    assert_eq!(last.competency_id, Some("video_analysis".into()));
}

#[test]
fn test_reservations_accumulate_and_release() {
    let engine = CompetencyEngine::new(small_config()).unwrap();
    register(&engine, "a", "fitness");
    register(&engine, "b", "nutrition");

    let heavy = ResourceUsage::new(10.0, 30.0, 1.0);
    assert!(engine.activate_competency(request("a", heavy)).success);
    assert_eq!(engine.reserved_resources(), heavy);
    let reservations = engine.get_reservations();
    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0].competency_id, "a".into());
    assert_eq!(reservations[0].reserved, heavy);

    let second = engine.activate_competency(request("b", heavy));
    assert_eq!(second.error.as_deref(), Some("Insufficient resources"));

    assert!(engine.deactivate_competency(&"a".into()));
    assert_eq!(engine.reserved_resources(), ResourceUsage::zero());
    assert!(engine.get_reservations().is_empty());
    assert!(engine.activate_competency(request("b", heavy)).success);
}

#[test]
fn test_concurrency_cap_enforced() {
    let engine = CompetencyEngine::new(small_config()).unwrap();
    for id in ["a", "b", "c"] {
        register(&engine, id, id);
    }

    assert!(engine.activate_competency(request("a", ResourceUsage::zero())).success);
    assert!(engine.activate_competency(request("b", ResourceUsage::zero())).success);
    let third = engine.activate_competency(request("c", ResourceUsage::zero()));
    assert_eq!(third.error.as_deref(), Some("Insufficient resources"));
    assert_eq!(engine.get_active_competencies().len(), 2);
}

#[test]
fn test_invalid_resources_rejected() {
    let engine = CompetencyEngine::new(small_config()).unwrap();
    register(&engine, "a", "fitness");

    let negative = engine.activate_competency(request("a", ResourceUsage::new(-1.0, 0.0, 0.0)));
    assert!(!negative.success);
    assert!(negative.error.unwrap().contains("memory"));

    let nan = engine.activate_competency(request("a", ResourceUsage::new(0.0, f64::NAN, 0.0)));
    assert!(!nan.success);
    assert!(engine.get_active_competencies().is_empty());
}

#[test]
fn test_concurrent_activations_never_overshoot() {
    let config = ScalabilityConfig {
        max_concurrent_competencies: 4,
        cpu_limit_percent: 25.0,
        ..Default::default()
    };
    let engine = Arc::new(CompetencyEngine::new(config).unwrap());
    for i in 0..20 {
        register(&engine, &format!("c{}", i), &format!("domain{}", i));
    }

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .activate_competency(request(&format!("c{}", i), ResourceUsage::new(1.0, 30.0, 1.0)))
                    .success
            })
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    // 3 x 30% fits in 100%, a fourth does not
    assert_eq!(admitted, 3);
    assert_eq!(engine.get_active_competencies().len(), 3);
    assert!(engine.reserved_resources().cpu_percent <= 100.0);
}
