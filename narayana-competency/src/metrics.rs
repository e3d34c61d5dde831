//! Per-competency performance metrics

use crate::admission::ResourceUsage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Satisfaction scores are on a 1..=5 scale
pub const MIN_SATISFACTION: u8 = 1;
pub const MAX_SATISFACTION: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub activation_count: u64,
    /// Mean executor run time in milliseconds
    pub average_execution_time_ms: f64,
    /// Failed executions over all executions, 0..=1
    pub error_rate: f64,
    /// Mean reservation over all activations
    pub average_resource_usage: ResourceUsage,
    /// Mean feedback score, 0 until the first feedback arrives
    pub user_satisfaction: f64,
    pub execution_count: u64,
    pub error_count: u64,
    pub feedback_count: u64,
    pub last_updated: DateTime<Utc>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            activation_count: 0,
            average_execution_time_ms: 0.0,
            error_rate: 0.0,
            average_resource_usage: ResourceUsage::zero(),
            user_satisfaction: 0.0,
            execution_count: 0,
            error_count: 0,
            feedback_count: 0,
            last_updated: Utc::now(),
        }
    }
}

fn running_mean(mean: f64, count: u64, sample: f64) -> f64 {
    // count includes the new sample
    mean + (sample - mean) / count as f64
}

impl PerformanceMetrics {
    /// Count an activation and remember what it reserved
    pub fn record_activation(&mut self, reserved: &ResourceUsage) {
        self.activation_count = self.activation_count.saturating_add(1);
        let n = self.activation_count;
        let avg = &mut self.average_resource_usage;
        avg.memory_mb = running_mean(avg.memory_mb, n, reserved.memory_mb);
        avg.cpu_percent = running_mean(avg.cpu_percent, n, reserved.cpu_percent);
        avg.network_mbps = running_mean(avg.network_mbps, n, reserved.network_mbps);
        self.last_updated = Utc::now();
    }

    /// Fold one execution into the response-time and error-rate means
    pub fn record_execution(&mut self, elapsed: Duration, succeeded: bool) {
        self.execution_count = self.execution_count.saturating_add(1);
        if !succeeded {
            self.error_count = self.error_count.saturating_add(1);
        }
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.average_execution_time_ms =
            running_mean(self.average_execution_time_ms, self.execution_count, elapsed_ms);
        self.error_rate = self.error_count as f64 / self.execution_count as f64;
        self.last_updated = Utc::now();
    }

    /// Fold a 1..=5 score into the running average. Caller validates the range.
    pub fn record_feedback(&mut self, score: u8) {
        self.feedback_count = self.feedback_count.saturating_add(1);
        self.user_satisfaction =
            running_mean(self.user_satisfaction, self.feedback_count, f64::from(score));
        self.last_updated = Utc::now();
    }
}
