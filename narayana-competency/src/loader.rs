//! Host-supplied collaborators: module loader and competency executor

use crate::competency::{CompetencyContext, CompetencyId, CompetencyModule};
use crate::error::Result;
use crate::mailbox::CrossCompetencyMessage;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Turns an identifier into a loadable competency descriptor
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// `Ok(None)` means the loader does not know `module_id`
    async fn load(&self, module_id: &CompetencyId) -> Result<Option<CompetencyModule>>;
}

/// Everything an executor receives for one run
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub competency_id: CompetencyId,
    pub context: CompetencyContext,
    /// Messages that asked this competency for a response, oldest first
    pub inbox: Vec<CrossCompetencyMessage>,
}

/// Runs a competency's domain work
#[async_trait]
pub trait CompetencyExecutor: Send + Sync {
    async fn execute(&self, execution: &ExecutionContext) -> Result<JsonValue>;
}

/// In-memory loader backed by a map of descriptors
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: RwLock<HashMap<CompetencyId, CompetencyModule>>,
    calls: RwLock<Vec<CompetencyId>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(self, module: CompetencyModule) -> Self {
        self.insert(module);
        self
    }

    /// Make a module available to later loads
    pub fn insert(&self, module: CompetencyModule) {
        self.modules.write().insert(module.id.clone(), module);
    }

    /// Ids requested so far, in call order
    pub fn load_calls(&self) -> Vec<CompetencyId> {
        self.calls.read().clone()
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(&self, module_id: &CompetencyId) -> Result<Option<CompetencyModule>> {
        self.calls.write().push(module_id.clone());
        Ok(self.modules.read().get(module_id).cloned())
    }
}
