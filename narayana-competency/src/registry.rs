//! Competency registry: modules, registration order and metrics

use crate::competency::{CompetencyId, CompetencyModule};
use crate::error::{CompetencyError, Result};
use crate::metrics::PerformanceMetrics;
use std::collections::HashMap;
use tracing::debug;

/// Authoritative store of known competencies.
///
/// Not internally synchronized; the engine owns it behind its state lock.
#[derive(Debug, Default)]
pub struct CompetencyRegistry {
    modules: HashMap<CompetencyId, CompetencyModule>,
    /// Registration order, used to break priority ties
    order: Vec<CompetencyId>,
    metrics: HashMap<CompetencyId, PerformanceMetrics>,
}

impl CompetencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a competency.
    ///
    /// Fails on invalid fields, a duplicate id, or a dependency that is not yet registered.
    pub fn register(&mut self, module: CompetencyModule) -> Result<()> {
        module.validate()?;

        if self.modules.contains_key(&module.id) {
            return Err(CompetencyError::Validation(format!(
                "Competency with ID '{}' already registered",
                module.id
            )));
        }

        let missing: Vec<&str> = module
            .dependencies
            .iter()
            .filter(|dep| !self.modules.contains_key(*dep))
            .map(|dep| dep.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(CompetencyError::Validation(format!(
                "Competency '{}' has unregistered dependencies: {}",
                module.id,
                missing.join(", ")
            )));
        }

        let id = module.id.clone();
        debug!("Registry insert: {} ({})", module.name, id);
        self.order.push(id.clone());
        self.metrics.insert(id.clone(), PerformanceMetrics::default());
        self.modules.insert(id, module);
        Ok(())
    }

    /// Remove a competency and its metrics.
    ///
    /// Fails only if the id is unknown. Dependents are left registered.
    pub fn remove(&mut self, id: &CompetencyId) -> Result<CompetencyModule> {
        if !self.modules.contains_key(id) {
            return Err(CompetencyError::NotFound(id.to_string()));
        }

        self.order.retain(|existing| existing != id);
        self.metrics.remove(id);
        self.modules
            .remove(id)
            .ok_or_else(|| CompetencyError::NotFound(id.to_string()))
    }

    /// Get module by id
    pub fn get(&self, id: &CompetencyId) -> Option<&CompetencyModule> {
        self.modules.get(id)
    }

    /// Check if registered
    pub fn contains(&self, id: &CompetencyId) -> bool {
        self.modules.contains_key(id)
    }

    /// Registered modules in registration order
    pub fn iter_ordered(&self) -> impl Iterator<Item = &CompetencyModule> {
        self.order.iter().filter_map(|id| self.modules.get(id))
    }

    /// Registered competencies that list `id` as a dependency, in registration order
    pub fn dependents_of(&self, id: &CompetencyId) -> Vec<CompetencyId> {
        self.iter_ordered()
            .filter(|module| module.dependencies.contains(id))
            .map(|module| module.id.clone())
            .collect()
    }

    /// Metrics for one competency
    pub fn metrics(&self, id: &CompetencyId) -> Option<&PerformanceMetrics> {
        self.metrics.get(id)
    }

    pub fn metrics_mut(&mut self, id: &CompetencyId) -> Option<&mut PerformanceMetrics> {
        self.metrics.get_mut(id)
    }

    /// Metrics for every registered competency
    pub fn all_metrics(&self) -> &HashMap<CompetencyId, PerformanceMetrics> {
        &self.metrics
    }

    /// Number of registered competencies
    pub fn count(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order_survives_removal() {
        let mut registry = CompetencyRegistry::new();
        for id in ["a", "b", "c"] {
            registry
                .register(CompetencyModule::new(id, id, "general"))
                .unwrap();
        }
        registry.remove(&CompetencyId::from("b")).unwrap();

        let ids: Vec<&str> = registry.iter_ordered().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(registry.metrics(&CompetencyId::from("b")).is_none());
    }

    #[test]
    fn test_remove_required_dependency() {
        let mut registry = CompetencyRegistry::new();
        registry
            .register(CompetencyModule::new("base", "Base", "general"))
            .unwrap();
        registry
            .register(CompetencyModule::new("child", "Child", "general").with_dependency("base"))
            .unwrap();
        assert_eq!(
            registry.dependents_of(&CompetencyId::from("base")),
            vec![CompetencyId::from("child")]
        );

        let removed = registry.remove(&CompetencyId::from("base")).unwrap();
        assert_eq!(removed.id, CompetencyId::from("base"));
        assert_eq!(registry.count(), 1);
        assert!(registry.contains(&CompetencyId::from("child")));
        assert!(registry.dependents_of(&CompetencyId::from("base")).is_empty());
        assert!(matches!(
            registry.remove(&CompetencyId::from("base")),
            Err(CompetencyError::NotFound(_))
        ));
    }
}
