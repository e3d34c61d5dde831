//! Activation requests, responses and the active set

use crate::admission::ResourceUsage;
use crate::competency::{CompetencyContext, CompetencyId};
use crate::conflict::Conflict;
use crate::error::CompetencyError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Caller's urgency tag; informational, recorded in events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationRequest {
    pub competency_id: CompetencyId,
    pub context: CompetencyContext,
    pub priority: ActivationPriority,
    pub reason: String,
    pub required_resources: ResourceUsage,
}

impl ActivationRequest {
    pub fn new(competency_id: impl Into<CompetencyId>, context: CompetencyContext) -> Self {
        Self {
            competency_id: competency_id.into(),
            context,
            priority: ActivationPriority::Medium,
            reason: String::new(),
            required_resources: ResourceUsage::zero(),
        }
    }

    pub fn with_resources(mut self, resources: ResourceUsage) -> Self {
        self.required_resources = resources;
        self
    }

    pub fn with_priority(mut self, priority: ActivationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationResponse {
    pub success: bool,
    pub activated: bool,
    pub error: Option<String>,
    /// Typed reason behind `error`
    #[serde(skip)]
    pub cause: Option<CompetencyError>,
    /// Resources reserved for the competency; zero on failure
    pub resource_usage: ResourceUsage,
    /// Wall-clock time from request receipt to decision
    pub execution_time: Duration,
    /// Conflicts recorded while deciding this request
    pub conflicts: Vec<Conflict>,
    /// Competencies deactivated to make room for this one
    pub preempted: Vec<CompetencyId>,
}

impl ActivationResponse {
    /// Rejected activation. `error` is the caller-facing message, `cause` the typed reason.
    pub fn failure(
        error: impl Into<String>,
        cause: CompetencyError,
        execution_time: Duration,
    ) -> Self {
        Self {
            success: false,
            activated: false,
            error: Some(error.into()),
            cause: Some(cause),
            resource_usage: ResourceUsage::zero(),
            execution_time,
            conflicts: Vec::new(),
            preempted: Vec::new(),
        }
    }

    /// Successful activation holding `resource_usage`
    pub fn activated(resource_usage: ResourceUsage, execution_time: Duration) -> Self {
        Self {
            success: true,
            activated: true,
            error: None,
            cause: None,
            resource_usage,
            execution_time,
            conflicts: Vec::new(),
            preempted: Vec::new(),
        }
    }

    pub fn with_conflicts(mut self, conflicts: Vec<Conflict>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn with_preempted(mut self, preempted: Vec<CompetencyId>) -> Self {
        self.preempted = preempted;
        self
    }
}

/// A member of the active set and what it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEntry {
    pub competency_id: CompetencyId,
    pub reserved: ResourceUsage,
    pub activated_at: DateTime<Utc>,
}

/// Active competencies in activation order
#[derive(Debug, Default)]
pub struct ActiveSet {
    entries: Vec<ActiveEntry>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &CompetencyId) -> bool {
        self.entries.iter().any(|e| &e.competency_id == id)
    }

    pub fn get(&self, id: &CompetencyId) -> Option<&ActiveEntry> {
        self.entries.iter().find(|e| &e.competency_id == id)
    }

    /// Add an entry. No-op if already active.
    pub fn insert(&mut self, competency_id: CompetencyId, reserved: ResourceUsage) {
        if self.contains(&competency_id) {
            return;
        }
        self.entries.push(ActiveEntry {
            competency_id,
            reserved,
            activated_at: Utc::now(),
        });
    }

    /// Remove an entry, returning what it held
    pub fn remove(&mut self, id: &CompetencyId) -> Option<ActiveEntry> {
        let index = self.entries.iter().position(|e| &e.competency_id == id)?;
        Some(self.entries.remove(index))
    }

    /// Sum of every active reservation
    pub fn reserved_total(&self) -> ResourceUsage {
        self.entries.iter().map(|e| e.reserved).sum()
    }

    pub fn ids(&self) -> Vec<CompetencyId> {
        self.entries.iter().map(|e| e.competency_id.clone()).collect()
    }

    pub fn entries(&self) -> &[ActiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
