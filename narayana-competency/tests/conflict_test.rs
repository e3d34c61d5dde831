//! Tests for conflict detection and resolution

use narayana_competency::{
    ActivationRequest, CompetencyContext, CompetencyEngine, CompetencyError, CompetencyId,
    CompetencyModule, Conflict, ConflictDetector, ConflictKind, ConflictResolver,
    DefaultConflictResolver, EventKind, Resolution, ResolutionStrategy, ScalabilityConfig, SameDomainPolicy, Severity,
};
use std::sync::Arc;

fn activate(engine: &CompetencyEngine, id: &str) -> narayana_competency::ActivationResponse {
    engine.activate_competency(ActivationRequest::new(
        id,
        CompetencyContext::new("user-1", "knee pain"),
    ))
}

fn engine_with(config: ScalabilityConfig, modules: &[(&str, &str, u8)]) -> CompetencyEngine {
    let engine = CompetencyEngine::new(config).unwrap();
    for (id, domain, priority) in modules {
        engine
            .register_competency(CompetencyModule::new(*id, *id, *domain).with_priority(*priority))
            .unwrap();
    }
    engine
}

#[test]
fn test_same_domain_conflict_recorded_and_resolved() {
    let engine = engine_with(
        ScalabilityConfig::default(),
        &[("injury_advisor", "health", 8), ("sleep_coach", "health", 5)],
    );

    assert!(activate(&engine, "injury_advisor").success);
    let response = activate(&engine, "sleep_coach");

    assert!(response.success);
    assert_eq!(response.conflicts.len(), 1);
    assert!(response.preempted.is_empty());
    assert_eq!(engine.get_active_competencies().len(), 2);

    let conflicts = engine.get_conflicts();
    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::Resource);
    assert_eq!(conflict.strategy, ResolutionStrategy::Priority);
    assert!(conflict.involves(&"injury_advisor".into()));
    assert!(conflict.involves(&"sleep_coach".into()));
    assert!(conflict.resolved);
    assert_eq!(
        conflict.resolution.as_deref(),
        Some("priority-based resolution applied")
    );
}

#[test]
fn test_different_domains_do_not_conflict() {
    let engine = engine_with(
        ScalabilityConfig::default(),
        &[("injury_advisor", "health", 8), ("meal_planner", "nutrition", 5)],
    );

    assert!(activate(&engine, "injury_advisor").success);
    let response = activate(&engine, "meal_planner");
    assert!(response.success);
    assert!(response.conflicts.is_empty());
    assert!(engine.get_conflicts().is_empty());
}

#[test]
fn test_exclusive_policy_blocks_lower_priority() {
    let config = ScalabilityConfig {
        same_domain_policy: SameDomainPolicy::Exclusive,
        ..Default::default()
    };
    let engine = engine_with(
        config,
        &[("injury_advisor", "health", 8), ("sleep_coach", "health", 8)],
    );

    assert!(activate(&engine, "injury_advisor").success);
    let response = activate(&engine, "sleep_coach");

    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Unresolved conflicts"));
    assert!(matches!(response.cause, Some(CompetencyError::Conflict(_))));
    assert_eq!(
        engine.get_active_competencies(),
        vec![CompetencyId::from("injury_advisor")]
    );

    let conflicts = engine.get_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert!(!conflicts[0].resolved);

    let last = engine.get_event_history().pop().unwrap();
    assert_eq!(last.kind, EventKind::CompetencyError);
    assert_eq!(last.severity, Severity::Warning);
}

#[test]
fn test_exclusive_policy_preempts_lower_priority() {
    let config = ScalabilityConfig {
        same_domain_policy: SameDomainPolicy::Exclusive,
        ..Default::default()
    };
    let engine = engine_with(
        config,
        &[("sleep_coach", "health", 4), ("injury_advisor", "health", 9)],
    );

    assert!(activate(&engine, "sleep_coach").success);
    let response = activate(&engine, "injury_advisor");

    assert!(response.success);
    assert_eq!(response.preempted, vec![CompetencyId::from("sleep_coach")]);
    assert_eq!(
        engine.get_active_competencies(),
        vec![CompetencyId::from("injury_advisor")]
    );
    assert!(engine.get_conflicts()[0].resolved);

    let deactivated = engine
        .get_event_history()
        .into_iter()
        .filter(|e| e.kind == EventKind::CompetencyDeactivated)
        .count();
    assert_eq!(deactivated, 1);
}

#[test]
fn test_preemption_frees_room_for_admission() {
    let config = ScalabilityConfig {
        max_concurrent_competencies: 1,
        same_domain_policy: SameDomainPolicy::Exclusive,
        ..Default::default()
    };
    let engine = engine_with(
        config,
        &[("sleep_coach", "health", 4), ("injury_advisor", "health", 9)],
    );

    assert!(activate(&engine, "sleep_coach").success);
    let response = activate(&engine, "injury_advisor");
    assert!(response.success);
    assert_eq!(engine.get_active_competencies().len(), 1);
}

#[test]
fn test_deferred_strategy_blocks_activation() {
    let config = ScalabilityConfig {
        conflict_strategy: ResolutionStrategy::Defer,
        ..Default::default()
    };
    let engine = engine_with(
        config,
        &[("injury_advisor", "health", 8), ("sleep_coach", "health", 5)],
    );

    assert!(activate(&engine, "injury_advisor").success);
    let response = activate(&engine, "sleep_coach");
    assert_eq!(response.error.as_deref(), Some("Unresolved conflicts"));
    assert_eq!(response.conflicts.len(), 1);
    assert_eq!(engine.get_conflicts()[0].strategy, ResolutionStrategy::Defer);
}

struct AlwaysCoexist;

impl ConflictResolver for AlwaysCoexist {
    fn resolve(
        &self,
        _conflict: &Conflict,
        _candidate: &CompetencyModule,
        _holder: &CompetencyModule,
        _policy: SameDomainPolicy,
    ) -> (Resolution, String) {
        (Resolution::Coexist, "host approved".to_string())
    }
}

#[test]
fn test_custom_resolver() {
    let config = ScalabilityConfig {
        conflict_strategy: ResolutionStrategy::Consensus,
        ..Default::default()
    };
    let engine = engine_with(
        config,
        &[("injury_advisor", "health", 8), ("sleep_coach", "health", 5)],
    )
    .with_resolver(Arc::new(AlwaysCoexist));

    assert!(activate(&engine, "injury_advisor").success);
    assert!(activate(&engine, "sleep_coach").success);
    assert_eq!(
        engine.get_conflicts()[0].resolution.as_deref(),
        Some("host approved")
    );
}

#[test]
fn test_detector_and_default_resolver() {
    let candidate = CompetencyModule::new("injury_advisor", "Injury Advisor", "health").with_priority(9);
    let holder = CompetencyModule::new("sleep_coach", "Sleep Coach", "health").with_priority(3);
    let other = CompetencyModule::new("meal_planner", "Meal Planner", "nutrition");

    let conflicts = ConflictDetector::detect(
        &candidate,
        [&holder, &other],
        ResolutionStrategy::Priority,
    );
    assert_eq!(conflicts.len(), 1);
    assert_eq!(
        conflicts[0].competencies,
        vec![CompetencyId::from("sleep_coach"), CompetencyId::from("injury_advisor")]
    );

    let resolver = DefaultConflictResolver;
    let (coexist, _) = resolver.resolve(&conflicts[0], &candidate, &holder, SameDomainPolicy::Coexist);
    assert_eq!(coexist, Resolution::Coexist);

    let (preempt, note) =
        resolver.resolve(&conflicts[0], &candidate, &holder, SameDomainPolicy::Exclusive);
    assert_eq!(preempt, Resolution::Preempt("sleep_coach".into()));
    assert!(note.contains("preempts"));

    let (blocked, _) =
        resolver.resolve(&conflicts[0], &holder, &candidate, SameDomainPolicy::Exclusive);
    assert_eq!(blocked, Resolution::Unresolved);
}
