//! Scalability configuration for the competency engine

use crate::admission::ResourceUsage;
use crate::conflict::{ResolutionStrategy, SameDomainPolicy};
use crate::error::{CompetencyError, Result};
use crate::scaling::AutoScalingPolicy;
use serde::{Deserialize, Serialize};

/// How resources are framed in analytics. Admission is not affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    #[default]
    Balanced,
    Priority,
    Performance,
}

/// Process-wide tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalabilityConfig {
    /// Maximum number of simultaneously active competencies
    pub max_concurrent_competencies: usize,
    pub allocation_strategy: AllocationStrategy,
    /// Enable periodic re-evaluation of `max_concurrent_competencies`
    pub auto_scaling: bool,
    pub auto_scaling_policy: AutoScalingPolicy,
    /// Per-competency memory ceiling in megabytes
    pub memory_limit_mb: f64,
    /// Per-competency CPU ceiling in percent
    pub cpu_limit_percent: f64,
    /// Per-competency network ceiling in megabits per second
    pub network_limit_mbps: f64,
    /// Cache context-matching results
    pub enable_caching: bool,
    pub cache_ttl_seconds: u64,
    pub cache_capacity: usize,
    /// Full event history cap
    pub event_history_cap: usize,
    /// Recent-event window reported by analytics
    pub analytics_window: usize,
    /// Timeout for a single module loader invocation
    pub loader_timeout_ms: u64,
    pub conflict_strategy: ResolutionStrategy,
    pub same_domain_policy: SameDomainPolicy,
}

impl Default for ScalabilityConfig {
    fn default() -> Self {
        Self {
            max_concurrent_competencies: 10,
            allocation_strategy: AllocationStrategy::Balanced,
            auto_scaling: false,
            auto_scaling_policy: AutoScalingPolicy::default(),
            memory_limit_mb: 512.0,
            cpu_limit_percent: 25.0,
            network_limit_mbps: 10.0,
            enable_caching: true,
            cache_ttl_seconds: 300,
            cache_capacity: 256,
            event_history_cap: 1000,
            analytics_window: 100,
            loader_timeout_ms: 5000,
            conflict_strategy: ResolutionStrategy::Priority,
            same_domain_policy: SameDomainPolicy::Coexist,
        }
    }
}

impl ScalabilityConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ScalabilityConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_competencies == 0 {
            return Err(CompetencyError::Config(
                "Max concurrent competencies must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("memory_limit_mb", self.memory_limit_mb),
            ("cpu_limit_percent", self.cpu_limit_percent),
            ("network_limit_mbps", self.network_limit_mbps),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CompetencyError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.event_history_cap == 0 {
            return Err(CompetencyError::Config(
                "Event history cap must be greater than 0".to_string(),
            ));
        }

        if self.analytics_window == 0 || self.analytics_window > self.event_history_cap {
            return Err(CompetencyError::Config(format!(
                "Analytics window must be between 1 and the event history cap ({})",
                self.event_history_cap
            )));
        }

        if self.loader_timeout_ms == 0 {
            return Err(CompetencyError::Config(
                "Loader timeout must be greater than 0".to_string(),
            ));
        }

        if self.enable_caching && self.cache_capacity == 0 {
            return Err(CompetencyError::Config(
                "Cache capacity must be greater than 0 when caching is enabled".to_string(),
            ));
        }

        self.auto_scaling_policy.validate()
    }

    /// Ceilings a single competency may claim
    pub fn per_competency_limits(&self) -> ResourceUsage {
        ResourceUsage {
            memory_mb: self.memory_limit_mb,
            cpu_percent: self.cpu_limit_percent,
            network_mbps: self.network_limit_mbps,
        }
    }

    /// Budget shared by the whole active set: per-competency ceiling times max concurrency
    pub fn total_budget(&self) -> ResourceUsage {
        self.per_competency_limits()
            .scaled(self.max_concurrent_competencies as f64)
    }
}

/// Partial configuration update. `None` leaves the current value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub max_concurrent_competencies: Option<usize>,
    pub allocation_strategy: Option<AllocationStrategy>,
    pub auto_scaling: Option<bool>,
    pub auto_scaling_policy: Option<AutoScalingPolicy>,
    pub memory_limit_mb: Option<f64>,
    pub cpu_limit_percent: Option<f64>,
    pub network_limit_mbps: Option<f64>,
    pub enable_caching: Option<bool>,
    pub cache_ttl_seconds: Option<u64>,
    pub event_history_cap: Option<usize>,
    pub analytics_window: Option<usize>,
    pub loader_timeout_ms: Option<u64>,
    pub conflict_strategy: Option<ResolutionStrategy>,
    pub same_domain_policy: Option<SameDomainPolicy>,
}

impl ConfigUpdate {
    /// Produce the configuration that results from applying this update
    pub fn apply_to(&self, current: &ScalabilityConfig) -> ScalabilityConfig {
        let mut next = current.clone();
        if let Some(v) = self.max_concurrent_competencies {
            next.max_concurrent_competencies = v;
        }
        if let Some(v) = self.allocation_strategy {
            next.allocation_strategy = v;
        }
        if let Some(v) = self.auto_scaling {
            next.auto_scaling = v;
        }
        if let Some(v) = &self.auto_scaling_policy {
            next.auto_scaling_policy = v.clone();
        }
        if let Some(v) = self.memory_limit_mb {
            next.memory_limit_mb = v;
        }
        if let Some(v) = self.cpu_limit_percent {
            next.cpu_limit_percent = v;
        }
        if let Some(v) = self.network_limit_mbps {
            next.network_limit_mbps = v;
        }
        if let Some(v) = self.enable_caching {
            next.enable_caching = v;
        }
        if let Some(v) = self.cache_ttl_seconds {
            next.cache_ttl_seconds = v;
        }
        if let Some(v) = self.event_history_cap {
            next.event_history_cap = v;
        }
        if let Some(v) = self.analytics_window {
            next.analytics_window = v;
        }
        if let Some(v) = self.loader_timeout_ms {
            next.loader_timeout_ms = v;
        }
        if let Some(v) = self.conflict_strategy {
            next.conflict_strategy = v;
        }
        if let Some(v) = self.same_domain_policy {
            next.same_domain_policy = v;
        }
        next
    }
}
