//! Conflict detection and resolution between co-active competencies

use crate::competency::{CompetencyId, CompetencyModule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What two competencies contend over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Resource,
    Data,
    Recommendation,
    Activation,
}

/// How a conflict is to be settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    #[default]
    Priority,
    Consensus,
    UserChoice,
    Defer,
}

/// Whether competencies of the same domain may be active together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameDomainPolicy {
    /// Same-domain overlap is recorded for audit and never blocks activation
    #[default]
    Coexist,
    /// One competency per domain; a strictly higher priority preempts the holder
    Exclusive,
}

/// A detected overlap between a candidate and an active competency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: String,
    /// Active competency first, candidate second
    pub competencies: Vec<CompetencyId>,
    pub kind: ConflictKind,
    pub description: String,
    pub strategy: ResolutionStrategy,
    pub resolved: bool,
    pub resolution: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Conflict {
    pub fn new(
        competencies: Vec<CompetencyId>,
        kind: ConflictKind,
        description: String,
        strategy: ResolutionStrategy,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            competencies,
            kind,
            description,
            strategy,
            resolved: false,
            resolution: None,
            timestamp: Utc::now(),
        }
    }

    pub fn involves(&self, id: &CompetencyId) -> bool {
        self.competencies.contains(id)
    }
}

/// Decision for a single conflict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Both stay active
    Coexist,
    /// Candidate wins; the named active competency is deactivated on commit
    Preempt(CompetencyId),
    /// Activation must not proceed
    Unresolved,
}

/// Pluggable resolution policy
pub trait ConflictResolver: Send + Sync {
    /// Decide `conflict` between the `candidate` and the active `holder`.
    /// Returns the decision and a note recorded on the conflict.
    fn resolve(
        &self,
        conflict: &Conflict,
        candidate: &CompetencyModule,
        holder: &CompetencyModule,
        policy: SameDomainPolicy,
    ) -> (Resolution, String);
}

/// Built-in resolver: implements `Priority`, leaves the other strategies unresolved
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConflictResolver;

impl ConflictResolver for DefaultConflictResolver {
    fn resolve(
        &self,
        conflict: &Conflict,
        candidate: &CompetencyModule,
        holder: &CompetencyModule,
        policy: SameDomainPolicy,
    ) -> (Resolution, String) {
        match (conflict.strategy, policy) {
            (ResolutionStrategy::Priority, SameDomainPolicy::Coexist) => (
                Resolution::Coexist,
                "priority-based resolution applied".to_string(),
            ),
            (ResolutionStrategy::Priority, SameDomainPolicy::Exclusive) => {
                if candidate.priority > holder.priority {
                    (
                        Resolution::Preempt(holder.id.clone()),
                        format!(
                            "priority-based resolution applied: '{}' ({}) preempts '{}' ({})",
                            candidate.id, candidate.priority, holder.id, holder.priority
                        ),
                    )
                } else {
                    (
                        Resolution::Unresolved,
                        format!(
                            "'{}' holds domain '{}' with priority {} >= {}",
                            holder.id, holder.domain, holder.priority, candidate.priority
                        ),
                    )
                }
            }
            (ResolutionStrategy::Consensus, _) => (
                Resolution::Unresolved,
                format!("consensus required between '{}' and '{}'", holder.id, candidate.id),
            ),
            (ResolutionStrategy::UserChoice, _) => {
                (Resolution::Unresolved, "awaiting user choice".to_string())
            }
            (ResolutionStrategy::Defer, _) => {
                (Resolution::Unresolved, "resolution deferred".to_string())
            }
        }
    }
}

/// Result of resolving every conflict for one activation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionReport {
    pub conflicts: Vec<Conflict>,
    /// Active competencies to deactivate when the activation commits
    pub preempt: Vec<CompetencyId>,
}

impl ResolutionReport {
    /// True when no conflict is left unresolved
    pub fn all_resolved(&self) -> bool {
        self.conflicts.iter().all(|c| c.resolved)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| !c.resolved)
    }
}

/// Finds and settles overlaps with the active set
pub struct ConflictDetector;

impl ConflictDetector {
    /// One `Resource` conflict per active competency sharing the candidate's domain
    pub fn detect<'a, I>(
        candidate: &CompetencyModule,
        active: I,
        strategy: ResolutionStrategy,
    ) -> Vec<Conflict>
    where
        I: IntoIterator<Item = &'a CompetencyModule>,
    {
        active
            .into_iter()
            .filter(|holder| holder.id != candidate.id && holder.domain == candidate.domain)
            .map(|holder| {
                Conflict::new(
                    vec![holder.id.clone(), candidate.id.clone()],
                    ConflictKind::Resource,
                    format!(
                        "'{}' and '{}' both operate in domain '{}'",
                        holder.id, candidate.id, candidate.domain
                    ),
                    strategy,
                )
            })
            .collect()
    }

    /// Apply `resolver` to each conflict. `lookup` maps an active id to its module.
    pub fn resolve<'a, F>(
        mut conflicts: Vec<Conflict>,
        candidate: &CompetencyModule,
        lookup: F,
        resolver: &dyn ConflictResolver,
        policy: SameDomainPolicy,
    ) -> ResolutionReport
    where
        F: Fn(&CompetencyId) -> Option<&'a CompetencyModule>,
    {
        let mut preempt = Vec::new();

        for conflict in conflicts.iter_mut() {
            let holder = conflict
                .competencies
                .iter()
                .find(|id| **id != candidate.id)
                .and_then(|id| lookup(id));

            let Some(holder) = holder else {
                // Holder vanished between detection and resolution
                conflict.resolved = true;
                conflict.resolution = Some("holder no longer active".to_string());
                continue;
            };

            let (resolution, note) = resolver.resolve(conflict, candidate, holder, policy);
            conflict.resolution = Some(note);
            match resolution {
                Resolution::Coexist => conflict.resolved = true,
                Resolution::Preempt(id) => {
                    conflict.resolved = true;
                    if !preempt.contains(&id) {
                        preempt.push(id);
                    }
                }
                Resolution::Unresolved => conflict.resolved = false,
            }
        }

        ResolutionReport { conflicts, preempt }
    }
}
