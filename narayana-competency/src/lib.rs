//! narayana-competency: Competency activation and resource scheduling
//!
//! Provides:
//! - Competency registry with dependency tracking
//! - Context matching through pluggable matchers
//! - Resource admission control against a configurable budget
//! - Same-domain conflict detection and resolution
//! - Module installation with recursive dependency loading
//! - Event history, analytics and auto-scaling

pub mod error;
pub mod competency;
pub mod matcher;
pub mod admission;
pub mod conflict;
pub mod metrics;
pub mod registry;
pub mod events;
pub mod mailbox;
pub mod cache;
pub mod loader;
pub mod lifecycle;
pub mod install;
pub mod scaling;
pub mod engine;
pub mod config;

pub use error::{CompetencyError, Result};
pub use competency::{
    ActivationRecord, CompetencyContext, CompetencyId, CompetencyMetadata, CompetencyModule,
    CompetencyState, SystemLoad,
};
pub use matcher::{AllOf, AnyOf, ContextMatcher, Matcher, Not, RegexMatcher, SubstringMatcher};
pub use admission::{AdmissionController, AdmissionDecision, ResourceUsage};
pub use conflict::{
    Conflict, ConflictDetector, ConflictKind, ConflictResolver, DefaultConflictResolver,
    Resolution, ResolutionReport, ResolutionStrategy, SameDomainPolicy,
};
pub use metrics::PerformanceMetrics;
pub use registry::CompetencyRegistry;
pub use events::{AnalyticsSnapshot, EventKind, ScalabilityEvent, Severity};
pub use mailbox::CrossCompetencyMessage;
pub use loader::{CompetencyExecutor, ExecutionContext, ModuleLoader, StaticModuleLoader};
pub use lifecycle::{ActivationPriority, ActivationRequest, ActivationResponse, ActiveEntry};
pub use install::{InstallRequest, InstallResponse};
pub use scaling::{AutoScalingPolicy, ScalingDecision};
pub use engine::CompetencyEngine;
pub use config::{AllocationStrategy, ConfigUpdate, ScalabilityConfig};
