//! Lifecycle event history and analytics snapshot

use crate::admission::ResourceUsage;
use crate::competency::CompetencyId;
use crate::config::AllocationStrategy;
use crate::metrics::PerformanceMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use tokio::sync::broadcast;

/// Broadcast buffer for live subscribers
const EVENT_CHANNEL_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CompetencyRegistered,
    CompetencyActivated,
    CompetencyDeactivated,
    ResourceLimitExceeded,
    CompetencyError,
    ScalingEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalabilityEvent {
    pub kind: EventKind,
    pub competency_id: Option<CompetencyId>,
    pub data: JsonValue,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
}

impl ScalabilityEvent {
    pub fn new(
        kind: EventKind,
        competency_id: Option<CompetencyId>,
        data: JsonValue,
        severity: Severity,
    ) -> Self {
        Self {
            kind,
            competency_id,
            data,
            timestamp: Utc::now(),
            severity,
        }
    }
}

/// Append-only event history with two independent caps
#[derive(Debug)]
pub struct EventLog {
    history: VecDeque<ScalabilityEvent>,
    recent: VecDeque<ScalabilityEvent>,
    history_cap: usize,
    window: usize,
    sender: broadcast::Sender<ScalabilityEvent>,
}

impl EventLog {
    /// Create a log keeping at most `history_cap` events and a `window`-sized recent view
    pub fn new(history_cap: usize, window: usize) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            history: VecDeque::with_capacity(history_cap.min(EVENT_CHANNEL_CAPACITY)),
            recent: VecDeque::with_capacity(window.min(EVENT_CHANNEL_CAPACITY)),
            history_cap: history_cap.max(1),
            window: window.max(1),
            sender,
        }
    }

    /// Append an event, evicting the oldest entries past either cap
    pub fn push(&mut self, event: ScalabilityEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event.clone());

        self.recent.push_back(event.clone());
        while self.recent.len() > self.window {
            self.recent.pop_front();
        }

        self.history.push_back(event);
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }
    }

    /// Apply new caps, trimming the oldest entries if they shrank
    pub fn set_caps(&mut self, history_cap: usize, window: usize) {
        self.history_cap = history_cap.max(1);
        self.window = window.max(1);
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }
        while self.recent.len() > self.window {
            self.recent.pop_front();
        }
    }

    /// Full capped history, oldest first
    pub fn history(&self) -> Vec<ScalabilityEvent> {
        self.history.iter().cloned().collect()
    }

    /// Recent window used by analytics
    pub fn recent(&self) -> Vec<ScalabilityEvent> {
        self.recent.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Subscribe to events pushed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ScalabilityEvent> {
        self.sender.subscribe()
    }
}

/// Point-in-time summary of registry and active-set state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub active_competencies: usize,
    pub total_competencies: usize,
    /// Mean of `1 - error_rate` across registered competencies; 1.0 with none registered
    pub system_performance: f64,
    /// Reserved resources as a fraction of the total budget, per dimension
    pub resource_utilization: ResourceUsage,
    pub allocation_strategy: AllocationStrategy,
    pub conflict_count: usize,
    pub competency_metrics: HashMap<CompetencyId, PerformanceMetrics>,
    pub recent_events: Vec<ScalabilityEvent>,
    pub generated_at: DateTime<Utc>,
}

/// Rolling system-performance estimate
pub fn system_performance<'a, I>(metrics: I) -> f64
where
    I: IntoIterator<Item = &'a PerformanceMetrics>,
{
    let (sum, count) = metrics
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), m| (sum + (1.0 - m.error_rate), count + 1));
    if count == 0 { 1.0 } else { sum / count as f64 }
}
