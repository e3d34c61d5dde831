//! Auto-scaling of the concurrency budget

use crate::admission::ResourceUsage;
use crate::config::ScalabilityConfig;
use crate::engine::WeakEngine;
use crate::error::{CompetencyError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScalingPolicy {
    /// Period between evaluations
    pub check_interval_ms: u64,
    /// Grow when utilization reaches this fraction
    pub scale_up_utilization: f64,
    /// Shrink when utilization falls to this fraction
    pub scale_down_utilization: f64,
    pub min_concurrent: usize,
    pub max_concurrent_ceiling: usize,
}

impl Default for AutoScalingPolicy {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
            scale_up_utilization: 0.8,
            scale_down_utilization: 0.3,
            min_concurrent: 1,
            max_concurrent_ceiling: 50,
        }
    }
}

impl AutoScalingPolicy {
    /// Validate interval, thresholds and bounds
    pub fn validate(&self) -> Result<()> {
        if self.check_interval_ms == 0 {
            return Err(CompetencyError::Config(
                "Auto-scaling interval must be greater than 0".to_string(),
            ));
        }
        let valid_fraction = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !valid_fraction(self.scale_up_utilization)
            || !valid_fraction(self.scale_down_utilization)
            || self.scale_down_utilization >= self.scale_up_utilization
        {
            return Err(CompetencyError::Config(format!(
                "Auto-scaling thresholds must satisfy 0 <= down ({}) < up ({}) <= 1",
                self.scale_down_utilization, self.scale_up_utilization
            )));
        }
        if self.min_concurrent == 0 || self.min_concurrent > self.max_concurrent_ceiling {
            return Err(CompetencyError::Config(format!(
                "Auto-scaling bounds must satisfy 1 <= min ({}) <= ceiling ({})",
                self.min_concurrent, self.max_concurrent_ceiling
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingDecision {
    Hold,
    ScaleUp { from: usize, to: usize },
    ScaleDown { from: usize, to: usize },
}

/// Larger of slot utilization and the busiest resource dimension
pub fn utilization(config: &ScalabilityConfig, active_count: usize, reserved: &ResourceUsage) -> f64 {
    let slots = active_count as f64 / config.max_concurrent_competencies.max(1) as f64;
    let resources = reserved.utilization_of(&config.total_budget()).max_dimension();
    slots.max(resources)
}

/// Decide one scaling step. Shrinking never strands current reservations.
pub fn evaluate(config: &ScalabilityConfig, active_count: usize, reserved: &ResourceUsage) -> ScalingDecision {
    let policy = &config.auto_scaling_policy;
    let current = config.max_concurrent_competencies;
    let load = utilization(config, active_count, reserved);

    if load >= policy.scale_up_utilization && current < policy.max_concurrent_ceiling {
        return ScalingDecision::ScaleUp {
            from: current,
            to: current + 1,
        };
    }

    if load <= policy.scale_down_utilization && current > policy.min_concurrent {
        let to = current - 1;
        let shrunk = ScalabilityConfig {
            max_concurrent_competencies: to,
            ..config.clone()
        };
        if active_count <= to && reserved.fits_within(&shrunk.total_budget()) {
            return ScalingDecision::ScaleDown { from: current, to };
        }
    }

    ScalingDecision::Hold
}

/// Handle to the background scaling task
pub struct AutoScaler {
    token: CancellationToken,
}

impl AutoScaler {
    /// Spawn the periodic evaluation loop. Requires a tokio runtime.
    pub(crate) fn spawn(engine: WeakEngine, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let child = token.child_token();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(engine) = engine.upgrade() else {
                            break;
                        };
                        match engine.evaluate_scaling() {
                            Ok(ScalingDecision::Hold) => {}
                            Ok(decision) => debug!("Auto-scaling step: {:?}", decision),
                            Err(CompetencyError::Closed) => break,
                            Err(e) => debug!("Auto-scaling skipped: {}", e),
                        }
                    }
                }
            }
            info!("Auto-scaling task stopped");
        });

        Self { token }
    }

    /// False once stopped or dropped
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Cancel the loop; safe to call more than once
    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for AutoScaler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
