//! Tests for activation, deactivation, execution and shutdown

use async_trait::async_trait;
use narayana_competency::{
    ActivationPriority, ActivationRequest, CompetencyContext, CompetencyEngine, CompetencyError,
    CompetencyExecutor, CompetencyId, CompetencyModule, CompetencyState, EventKind,
    ExecutionContext, RegexMatcher, ResourceUsage, ScalabilityConfig, Severity,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

fn engine_with_advisor() -> CompetencyEngine {
    let engine = CompetencyEngine::new(ScalabilityConfig::default()).unwrap();
    engine
        .register_competency(
            CompetencyModule::new("injury_advisor", "Injury Advisor", "health")
                .with_priority(8)
                .with_matcher(RegexMatcher::new("injury|pain").unwrap()),
        )
        .unwrap();
    engine
}

fn request(id: &str) -> ActivationRequest {
    ActivationRequest::new(id, CompetencyContext::new("user-1", "knee pain after squats"))
        .with_resources(ResourceUsage::new(64.0, 5.0, 1.0))
        .with_priority(ActivationPriority::High)
        .with_reason("matched topic")
}

fn advisor() -> CompetencyId {
    CompetencyId::from("injury_advisor")
}

#[test]
fn test_activate_unknown_competency() {
    let engine = engine_with_advisor();
    let response = engine.activate_competency(request("ghost"));

    assert!(!response.success);
    assert!(!response.activated);
    assert_eq!(response.error.as_deref(), Some("Competency not found"));
    assert_eq!(
        response.cause,
        Some(CompetencyError::NotFound("ghost".to_string()))
    );
}

#[test]
fn test_activate_within_budget() {
    let engine = engine_with_advisor();
    let response = engine.activate_competency(request("injury_advisor"));

    assert!(response.success);
    assert!(response.activated);
    assert_eq!(response.error, None);
    assert_eq!(response.resource_usage, ResourceUsage::new(64.0, 5.0, 1.0));
    assert_eq!(engine.get_active_competencies(), vec![advisor()]);
    assert_eq!(engine.state_of(&advisor()), Some(CompetencyState::Active));

    let metrics = engine.get_performance_metrics(Some(&advisor()));
    let metrics = &metrics[&advisor()];
    assert_eq!(metrics.activation_count, 1);
    assert_eq!(metrics.average_resource_usage, ResourceUsage::new(64.0, 5.0, 1.0));

    let last = engine.get_event_history().pop().unwrap();
    assert_eq!(last.kind, EventKind::CompetencyActivated);
    assert_eq!(last.severity, Severity::Info);
    assert_eq!(last.data["reason"], json!("matched topic"));
    assert_eq!(last.data["priority"], json!("high"));
}

#[test]
fn test_activation_is_idempotent() {
    let engine = engine_with_advisor();
    assert!(engine.activate_competency(request("injury_advisor")).success);

    let again = engine.activate_competency(request("injury_advisor"));
    assert!(again.success);
    assert!(again.activated);
    assert_eq!(engine.get_active_competencies().len(), 1);

    let metrics = engine.get_performance_metrics(None);
    assert_eq!(metrics[&advisor()].activation_count, 1);
}

#[test]
fn test_activate_disabled_competency() {
    let engine = CompetencyEngine::new(ScalabilityConfig::default()).unwrap();
    engine
        .register_competency(CompetencyModule::new("dormant", "Dormant", "health").disabled())
        .unwrap();

    let response = engine.activate_competency(request("dormant"));
    assert_eq!(response.error.as_deref(), Some("Competency disabled"));
    assert!(matches!(response.cause, Some(CompetencyError::Validation(_))));
    assert!(engine.get_active_competencies().is_empty());
}

#[test]
fn test_deactivate() {
    let engine = engine_with_advisor();
    assert!(!engine.deactivate_competency(&advisor()));

    engine.activate_competency(request("injury_advisor"));
    assert!(engine.deactivate_competency(&advisor()));
    assert!(!engine.deactivate_competency(&advisor()));

    assert!(engine.get_active_competencies().is_empty());
    assert_eq!(engine.state_of(&advisor()), Some(CompetencyState::Registered));
    assert_eq!(engine.reserved_resources(), ResourceUsage::zero());

    let deactivations = engine
        .get_event_history()
        .iter()
        .filter(|e| e.kind == EventKind::CompetencyDeactivated)
        .count();
    assert_eq!(deactivations, 1);
}

#[test]
fn test_reactivation_after_deactivation() {
    let engine = engine_with_advisor();
    engine.activate_competency(request("injury_advisor"));
    engine.deactivate_competency(&advisor());
    assert!(engine.activate_competency(request("injury_advisor")).success);

    let metrics = engine.get_performance_metrics(Some(&advisor()));
    assert_eq!(metrics[&advisor()].activation_count, 2);
}

#[test]
fn test_close_stops_mutations() {
    let engine = engine_with_advisor();
    engine.activate_competency(request("injury_advisor"));

    engine.close();

    assert!(engine.is_closed());
    assert!(engine.get_active_competencies().is_empty());

    let response = engine.activate_competency(request("injury_advisor"));
    assert_eq!(response.error.as_deref(), Some("Engine closed"));

    let result = engine.register_competency(CompetencyModule::new("late", "Late", "health"));
    assert_eq!(result, Err(CompetencyError::Closed));

    // Reads keep working
    assert_eq!(engine.get_registry().len(), 1);
    engine.close();
}

#[derive(Default)]
struct RecordingExecutor {
    fail: bool,
    inbox_sizes: Mutex<Vec<usize>>,
}

#[async_trait]
impl CompetencyExecutor for RecordingExecutor {
    async fn execute(&self, execution: &ExecutionContext) -> narayana_competency::Result<Value> {
        self.inbox_sizes.lock().push(execution.inbox.len());
        tokio::task::yield_now().await;
        if self.fail {
            Err(CompetencyError::Execution("model unavailable".to_string()))
        } else {
            Ok(json!({ "advice": "rest", "topic": execution.context.topic }))
        }
    }
}

#[tokio::test]
async fn test_execute_requires_active_competency() {
    let engine = engine_with_advisor();
    let executor = RecordingExecutor::default();
    let context = CompetencyContext::new("user-1", "knee pain");

    let result = engine.execute_competency(&advisor(), context.clone(), &executor).await;
    assert!(matches!(result, Err(CompetencyError::Validation(_))));

    let result = engine
        .execute_competency(&"ghost".into(), context, &executor)
        .await;
    assert!(matches!(result, Err(CompetencyError::NotFound(_))));
    assert!(executor.inbox_sizes.lock().is_empty());
}

#[tokio::test]
async fn test_execute_records_metrics() {
    let engine = engine_with_advisor();
    engine.activate_competency(request("injury_advisor"));

    let ok = RecordingExecutor::default();
    let value = engine
        .execute_competency(&advisor(), CompetencyContext::new("user-1", "knee pain"), &ok)
        .await
        .unwrap();
    assert_eq!(value["advice"], json!("rest"));

    let failing = RecordingExecutor {
        fail: true,
        ..Default::default()
    };
    let result = engine
        .execute_competency(&advisor(), CompetencyContext::new("user-1", "knee pain"), &failing)
        .await;
    assert!(matches!(result, Err(CompetencyError::Execution(_))));

    let metrics = engine.get_performance_metrics(Some(&advisor()));
    let metrics = &metrics[&advisor()];
    assert_eq!(metrics.execution_count, 2);
    assert_eq!(metrics.error_count, 1);
    assert!((metrics.error_rate - 0.5).abs() < 1e-9);

    let last = engine.get_event_history().pop().unwrap();
    assert_eq!(last.kind, EventKind::CompetencyError);
    assert_eq!(last.severity, Severity::Error);
    assert!((engine.get_analytics().system_performance - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_execute_delivers_pending_messages() {
    let engine = engine_with_advisor();
    engine
        .register_competency(CompetencyModule::new("sleep_coach", "Sleep Coach", "sleep"))
        .unwrap();
    engine.activate_competency(request("injury_advisor"));

    let sleep = CompetencyId::from("sleep_coach");
    engine
        .send_cross_competency_message(&sleep, &advisor(), "poor sleep", json!({ "hours": 5 }), true)
        .unwrap();
    engine
        .send_cross_competency_message(&sleep, &advisor(), "fyi", json!(null), false)
        .unwrap();

    let executor = RecordingExecutor::default();
    let context = CompetencyContext::new("user-1", "knee pain");
    engine
        .execute_competency(&advisor(), context.clone(), &executor)
        .await
        .unwrap();
    engine
        .execute_competency(&advisor(), context, &executor)
        .await
        .unwrap();

    assert_eq!(*executor.inbox_sizes.lock(), vec![1, 0]);
    assert_eq!(engine.get_communication_log().len(), 2);
}

#[tokio::test]
async fn test_deactivate_during_execution() {
    let engine = engine_with_advisor();
    engine.activate_competency(request("injury_advisor"));

    struct Deactivating(CompetencyEngine);

    #[async_trait]
    impl CompetencyExecutor for Deactivating {
        async fn execute(&self, execution: &ExecutionContext) -> narayana_competency::Result<Value> {
            assert!(self.0.deactivate_competency(&execution.competency_id));
            Ok(Value::Null)
        }
    }

    let executor = Deactivating(engine.clone());
    let result = engine
        .execute_competency(&advisor(), CompetencyContext::new("user-1", "pain"), &executor)
        .await;

    assert!(result.is_ok());
    assert!(engine.get_active_competencies().is_empty());
    let metrics = engine.get_performance_metrics(Some(&advisor()));
    assert_eq!(metrics[&advisor()].execution_count, 1);
}
