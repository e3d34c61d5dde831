//! Admission control against the shared resource budget

use crate::config::ScalabilityConfig;
use crate::error::{CompetencyError, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Resources claimed by, or reserved for, a competency
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub memory_mb: f64,
    pub cpu_percent: f64,
    pub network_mbps: f64,
}

impl ResourceUsage {
    pub fn new(memory_mb: f64, cpu_percent: f64, network_mbps: f64) -> Self {
        Self {
            memory_mb,
            cpu_percent,
            network_mbps,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            memory_mb: self.memory_mb * factor,
            cpu_percent: self.cpu_percent * factor,
            network_mbps: self.network_mbps * factor,
        }
    }

    /// Component-wise subtraction, clamped at zero
    pub fn saturating_sub(&self, other: &ResourceUsage) -> Self {
        Self {
            memory_mb: (self.memory_mb - other.memory_mb).max(0.0),
            cpu_percent: (self.cpu_percent - other.cpu_percent).max(0.0),
            network_mbps: (self.network_mbps - other.network_mbps).max(0.0),
        }
    }

    /// True if every dimension is within the matching dimension of `limit`
    pub fn fits_within(&self, limit: &ResourceUsage) -> bool {
        self.memory_mb <= limit.memory_mb
            && self.cpu_percent <= limit.cpu_percent
            && self.network_mbps <= limit.network_mbps
    }

    /// Fraction of `budget` used per dimension; zero-sized budgets report 0
    pub fn utilization_of(&self, budget: &ResourceUsage) -> ResourceUsage {
        fn ratio(used: f64, total: f64) -> f64 {
            if total > 0.0 { used / total } else { 0.0 }
        }
        Self {
            memory_mb: ratio(self.memory_mb, budget.memory_mb),
            cpu_percent: ratio(self.cpu_percent, budget.cpu_percent),
            network_mbps: ratio(self.network_mbps, budget.network_mbps),
        }
    }

    /// Largest single dimension
    pub fn max_dimension(&self) -> f64 {
        self.memory_mb.max(self.cpu_percent).max(self.network_mbps)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("memory", self.memory_mb),
            ("cpu", self.cpu_percent),
            ("network", self.network_mbps),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CompetencyError::Validation(format!(
                    "Requested {} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Add for ResourceUsage {
    type Output = ResourceUsage;

    fn add(self, rhs: ResourceUsage) -> ResourceUsage {
        ResourceUsage {
            memory_mb: self.memory_mb + rhs.memory_mb,
            cpu_percent: self.cpu_percent + rhs.cpu_percent,
            network_mbps: self.network_mbps + rhs.network_mbps,
        }
    }
}

impl AddAssign for ResourceUsage {
    fn add_assign(&mut self, rhs: ResourceUsage) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for ResourceUsage {
    fn sum<I: Iterator<Item = ResourceUsage>>(iter: I) -> Self {
        iter.fold(ResourceUsage::zero(), |acc, usage| acc + usage)
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub admitted: bool,
    /// Active-set usage plus the request
    pub projected: ResourceUsage,
    pub budget: ResourceUsage,
    /// Why the request was rejected; empty when admitted
    pub reasons: Vec<String>,
}

/// Decides whether an activation fits the configured budget
pub struct AdmissionController;

impl AdmissionController {
    /// Check `requested` against the budget given what the active set already holds.
    ///
    /// Each dimension is checked on its own:
    /// `current + requested <= per_competency_limit * max_concurrent`.
    /// The active set must also have room for one more competency.
    pub fn check(
        config: &ScalabilityConfig,
        current: &ResourceUsage,
        active_count: usize,
        requested: &ResourceUsage,
    ) -> AdmissionDecision {
        let budget = config.total_budget();
        let projected = *current + *requested;
        let mut reasons = Vec::new();

        if active_count >= config.max_concurrent_competencies {
            reasons.push(format!(
                "Active set is full ({} of {})",
                active_count, config.max_concurrent_competencies
            ));
        }

        let dimensions = [
            ("memory", projected.memory_mb, budget.memory_mb, "MB"),
            ("cpu", projected.cpu_percent, budget.cpu_percent, "%"),
            ("network", projected.network_mbps, budget.network_mbps, "Mbps"),
        ];
        for (name, used, limit, unit) in dimensions {
            if used > limit {
                reasons.push(format!(
                    "{} {:.2}{} exceeds budget {:.2}{}",
                    name, used, unit, limit, unit
                ));
            }
        }

        AdmissionDecision {
            admitted: reasons.is_empty(),
            projected,
            budget,
            reasons,
        }
    }
}
