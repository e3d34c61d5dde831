//! Activation triggers and context matching

use crate::competency::{CompetencyContext, CompetencyId, CompetencyModule};
use crate::error::{CompetencyError, Result};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a piece of free text should trigger a competency
pub trait Matcher: fmt::Debug + Send + Sync {
    fn accepts(&self, text: &str) -> bool;

    /// Short human-readable form, used in logs
    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

/// Regular-expression trigger. Case-insensitive unless built with [`RegexMatcher::case_sensitive`].
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        Self::build(pattern, true)
    }

    /// Like `new`, but matching case exactly
    pub fn case_sensitive(pattern: &str) -> Result<Self> {
        Self::build(pattern, false)
    }

    fn build(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| {
                CompetencyError::Validation(format!("Invalid matcher pattern '{}': {}", pattern, e))
            })?;
        Ok(Self { regex })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for RegexMatcher {
    fn accepts(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    fn describe(&self) -> String {
        format!("regex({})", self.regex.as_str())
    }
}

/// Keyword trigger: accepts text containing any of the keywords, ignoring case
#[derive(Debug, Clone)]
pub struct SubstringMatcher {
    keywords: Vec<String>,
}

impl SubstringMatcher {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.into().trim().to_lowercase())
            .collect();

        if keywords.is_empty() {
            return Err(CompetencyError::Validation(
                "Substring matcher needs at least one keyword".to_string(),
            ));
        }
        if keywords.iter().any(|k| k.is_empty()) {
            return Err(CompetencyError::Validation(
                "Substring matcher keywords cannot be empty".to_string(),
            ));
        }

        Ok(Self { keywords })
    }
}

impl Matcher for SubstringMatcher {
    fn accepts(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    fn describe(&self) -> String {
        format!("substring({})", self.keywords.join("|"))
    }
}

/// Accepts when any inner matcher accepts. Empty never accepts.
#[derive(Debug, Clone, Default)]
pub struct AnyOf(pub Vec<Arc<dyn Matcher>>);

impl AnyOf {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn or(mut self, matcher: impl Matcher + 'static) -> Self {
        self.0.push(Arc::new(matcher));
        self
    }
}

impl Matcher for AnyOf {
    fn accepts(&self, text: &str) -> bool {
        self.0.iter().any(|m| m.accepts(text))
    }

    fn describe(&self) -> String {
        let inner: Vec<String> = self.0.iter().map(|m| m.describe()).collect();
        format!("any({})", inner.join(", "))
    }
}

/// Accepts when every inner matcher accepts. Empty never accepts.
#[derive(Debug, Clone, Default)]
pub struct AllOf(pub Vec<Arc<dyn Matcher>>);

impl AllOf {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn and(mut self, matcher: impl Matcher + 'static) -> Self {
        self.0.push(Arc::new(matcher));
        self
    }
}

impl Matcher for AllOf {
    fn accepts(&self, text: &str) -> bool {
        !self.0.is_empty() && self.0.iter().all(|m| m.accepts(text))
    }

    fn describe(&self) -> String {
        let inner: Vec<String> = self.0.iter().map(|m| m.describe()).collect();
        format!("all({})", inner.join(", "))
    }
}

/// Inverts a matcher
#[derive(Debug, Clone)]
pub struct Not(pub Arc<dyn Matcher>);

impl Not {
    pub fn new(matcher: impl Matcher + 'static) -> Self {
        Self(Arc::new(matcher))
    }
}

impl Matcher for Not {
    fn accepts(&self, text: &str) -> bool {
        !self.0.accepts(text)
    }

    fn describe(&self) -> String {
        format!("not({})", self.0.describe())
    }
}

/// Finds the registered competencies relevant to a context
pub struct ContextMatcher;

impl ContextMatcher {
    /// Enabled modules with at least one accepting trigger, by descending priority.
    ///
    /// `modules` must be in registration order; equal priorities keep that order.
    pub fn find_compatible<'a, I>(modules: I, context: &CompetencyContext) -> Vec<CompetencyId>
    where
        I: IntoIterator<Item = &'a CompetencyModule>,
    {
        let mut candidates: Vec<&CompetencyModule> = modules
            .into_iter()
            .filter(|module| module.enabled && module.matches_context(context))
            .collect();

        // sort_by is stable
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

        candidates.into_iter().map(|m| m.id.clone()).collect()
    }
}
