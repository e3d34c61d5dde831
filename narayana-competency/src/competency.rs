//! Competency types and definitions

use crate::error::{CompetencyError, Result};
use crate::matcher::Matcher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Lowest and highest accepted module priority
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

/// Unique competency identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompetencyId(pub String);

impl CompetencyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompetencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CompetencyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CompetencyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a registered competency. Unregistered modules have no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetencyState {
    /// Known to the registry, not in the active set
    Registered,
    /// In the active set
    Active,
}

/// Authorship and compatibility information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyMetadata {
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Compatibility tags (host versions, platforms)
    pub compatibility: Vec<String>,
}

impl Default for CompetencyMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            author: String::new(),
            created_at: now,
            updated_at: now,
            compatibility: Vec::new(),
        }
    }
}

/// A pluggable capability unit with declared triggers and dependencies
#[derive(Debug, Clone)]
pub struct CompetencyModule {
    pub id: CompetencyId,
    pub name: String,
    pub version: String,
    /// Free-text category; competencies sharing a domain may conflict
    pub domain: String,
    pub capabilities: BTreeSet<String>,
    /// Competencies that must be registered before this one
    pub dependencies: Vec<CompetencyId>,
    pub enabled: bool,
    /// 1..=10, higher is preferred
    pub priority: u8,
    /// Activation triggers; any one accepting the context makes this a candidate
    pub matchers: Vec<Arc<dyn Matcher>>,
    pub required_permissions: BTreeSet<String>,
    pub metadata: CompetencyMetadata,
}

impl CompetencyModule {
    /// Create a new enabled module with priority 5 and no triggers
    pub fn new(id: impl Into<CompetencyId>, name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: "1.0.0".to_string(),
            domain: domain.into(),
            capabilities: BTreeSet::new(),
            dependencies: Vec::new(),
            enabled: true,
            priority: 5,
            matchers: Vec::new(),
            required_permissions: BTreeSet::new(),
            metadata: CompetencyMetadata::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matchers.push(Arc::new(matcher));
        self
    }

    pub fn with_dependency(mut self, dependency: impl Into<CompetencyId>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.required_permissions.insert(permission.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Check the module's own fields. Registry-level checks (duplicates, dependencies) live in the registry.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("id", self.id.as_str()),
            ("name", self.name.as_str()),
            ("version", self.version.as_str()),
            ("domain", self.domain.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CompetencyError::Validation(format!(
                    "Competency {} cannot be empty",
                    field
                )));
            }
        }

        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return Err(CompetencyError::Validation(format!(
                "Competency '{}' priority {} outside {}..={}",
                self.id, self.priority, MIN_PRIORITY, MAX_PRIORITY
            )));
        }

        if self.dependencies.contains(&self.id) {
            return Err(CompetencyError::Validation(format!(
                "Competency '{}' cannot depend on itself",
                self.id
            )));
        }

        Ok(())
    }

    /// True if any trigger accepts the context's topic, intent or one of its data points
    pub fn matches_context(&self, context: &CompetencyContext) -> bool {
        self.matchers.iter().any(|matcher| {
            context
                .candidate_texts()
                .any(|text| matcher.accepts(text))
        })
    }
}

/// System load sampled when a context is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemLoad {
    pub cpu: f64,
    pub memory: f64,
    pub network: f64,
}

/// One entry of a context's activation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub competency_id: CompetencyId,
    pub activated_at: DateTime<Utc>,
    pub reason: String,
}

/// Caller-built description of the conversation a competency may respond to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetencyContext {
    pub user_id: String,
    pub topic: String,
    pub intent: String,
    pub data_points: Vec<String>,
    pub active_competencies: Vec<CompetencyId>,
    pub activation_history: Vec<ActivationRecord>,
    pub system_load: SystemLoad,
}

impl CompetencyContext {
    pub fn new(user_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    pub fn with_data_point(mut self, data_point: impl Into<String>) -> Self {
        self.data_points.push(data_point.into());
        self
    }

    /// Non-empty topic, intent and data points, in that order
    pub fn candidate_texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.topic.as_str())
            .chain(std::iter::once(self.intent.as_str()))
            .chain(self.data_points.iter().map(String::as_str))
            .filter(|text| !text.trim().is_empty())
    }

    /// Stable key identifying the matchable part of the context
    pub(crate) fn match_key(&self) -> String {
        let mut key = String::with_capacity(self.topic.len() + self.intent.len() + 16);
        for text in self.candidate_texts() {
            key.push_str(text);
            key.push('\u{1f}');
        }
        key
    }
}
