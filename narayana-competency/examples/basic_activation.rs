//! Register, match, activate and install competencies end to end.
//!
//! Run with `RUST_LOG=info cargo run -p narayana-competency --example basic_activation`.

use narayana_competency::{
    ActivationRequest, CompetencyContext, CompetencyEngine, CompetencyModule, InstallRequest,
    RegexMatcher, ResourceUsage, ScalabilityConfig, StaticModuleLoader, SubstringMatcher,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let loader = Arc::new(
        StaticModuleLoader::new()
            .with_module(
                CompetencyModule::new("workout_planner", "Workout Planner", "fitness")
                    .with_priority(6)
                    .with_dependency("exercise_library")
                    .with_matcher(SubstringMatcher::new(["workout", "training"])?),
            )
            .with_module(CompetencyModule::new("exercise_library", "Exercise Library", "fitness")),
    );

    let engine = CompetencyEngine::new(ScalabilityConfig::default())?.with_loader(loader);

    engine.register_competency(
        CompetencyModule::new("injury_advisor", "Injury Advisor", "health")
            .with_priority(8)
            .with_matcher(RegexMatcher::new("injury|pain")?),
    )?;

    let installed = engine.install_module(InstallRequest::new("workout_planner")).await;
    println!(
        "installed {} (dependencies: {:?}) in {:?}",
        installed.module_id, installed.dependencies_installed, installed.elapsed
    );

    let context = CompetencyContext::new("user-1", "knee pain after training");
    let candidates = engine.get_compatible_competencies(&context);
    println!("candidates: {:?}", candidates);

    for id in candidates {
        let response = engine.activate_competency(
            ActivationRequest::new(id.clone(), context.clone())
                .with_resources(ResourceUsage::new(128.0, 10.0, 1.0))
                .with_reason("topic match"),
        );
        println!(
            "{}: success={} error={:?} conflicts={}",
            id,
            response.success,
            response.error,
            response.conflicts.len()
        );
    }

    engine.send_cross_competency_message(
        &"injury_advisor".into(),
        &"workout_planner".into(),
        "avoid deep squats",
        json!({ "joint": "knee" }),
        true,
    )?;
    engine.record_user_feedback(&"injury_advisor".into(), 5, Some("helpful"))?;

    let analytics = engine.get_analytics();
    println!("{}", serde_json::to_string_pretty(&analytics)?);

    engine.close();
    Ok(())
}
