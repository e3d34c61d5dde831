//! Installation service: recursive dependency installation through a module loader

use crate::competency::{CompetencyId, CompetencyModule};
use crate::engine::CompetencyEngine;
use crate::error::{CompetencyError, Result};
use crate::loader::ModuleLoader;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub module_id: CompetencyId,
}

impl InstallRequest {
    pub fn new(module_id: impl Into<CompetencyId>) -> Self {
        Self {
            module_id: module_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallResponse {
    pub success: bool,
    pub module_id: CompetencyId,
    /// Dependencies registered during this call, in registration order.
    /// On failure, those registered before the failing step.
    pub dependencies_installed: Vec<CompetencyId>,
    pub error: Option<String>,
    pub elapsed: Duration,
}

type InstallFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// One installation run. Tracks the in-progress chain to catch cycles.
pub(crate) struct Installer<'a> {
    engine: &'a CompetencyEngine,
    loader: &'a dyn ModuleLoader,
    timeout: Duration,
    root: CompetencyId,
    in_progress: Vec<CompetencyId>,
    installed: Vec<CompetencyId>,
}

impl<'a> Installer<'a> {
    pub(crate) fn new(
        engine: &'a CompetencyEngine,
        loader: &'a dyn ModuleLoader,
        timeout: Duration,
        root: CompetencyId,
    ) -> Self {
        Self {
            engine,
            loader,
            timeout,
            root,
            in_progress: Vec::new(),
            installed: Vec::new(),
        }
    }

    pub(crate) async fn run(mut self) -> InstallResponse {
        let started = Instant::now();
        let root = self.root.clone();

        let result = if self.engine.is_registered(&root) {
            Err(CompetencyError::Validation(format!(
                "Competency '{}' is already installed",
                root
            )))
        } else {
            self.install_one(root.clone()).await
        };

        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                info!(
                    "Installed {} with {} dependencies in {:?}",
                    root,
                    self.installed.len(),
                    elapsed
                );
                InstallResponse {
                    success: true,
                    module_id: root,
                    dependencies_installed: self.installed,
                    error: None,
                    elapsed,
                }
            }
            Err(e) => {
                warn!(
                    "Install of {} failed after {:?} ({} dependencies installed): {}",
                    root,
                    elapsed,
                    self.installed.len(),
                    e
                );
                self.engine.record_install_failure(&root, &e, &self.installed);
                InstallResponse {
                    success: false,
                    module_id: root,
                    dependencies_installed: self.installed,
                    error: Some(e.to_string()),
                    elapsed,
                }
            }
        }
    }

    fn install_one(&mut self, id: CompetencyId) -> InstallFuture<'_> {
        Box::pin(async move {
            if let Some(start) = self.in_progress.iter().position(|p| *p == id) {
                let mut chain: Vec<&str> = self.in_progress[start..].iter().map(|p| p.as_str()).collect();
                chain.push(id.as_str());
                return Err(CompetencyError::CircularDependency(chain.join(" -> ")));
            }

            self.in_progress.push(id.clone());
            let result = self.load_and_register(&id).await;
            self.in_progress.pop();
            result
        })
    }

    async fn load_and_register(&mut self, id: &CompetencyId) -> Result<()> {
        let module = self.load(id).await?;

        for dependency in module.dependencies.clone() {
            if self.engine.is_registered(&dependency) {
                continue;
            }
            debug!("{} requires {}, installing first", id, dependency);
            self.install_one(dependency).await?;
        }

        if *id != self.root && self.engine.is_registered(id) {
            // Installed concurrently by another caller
            return Ok(());
        }

        self.engine.register_competency(module)?;
        if *id != self.root {
            self.installed.push(id.clone());
        }
        Ok(())
    }

    async fn load(&self, id: &CompetencyId) -> Result<CompetencyModule> {
        let loaded = tokio::time::timeout(self.timeout, self.loader.load(id))
            .await
            .map_err(|_| CompetencyError::Timeout {
                module_id: id.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?;

        let module = match loaded {
            Ok(Some(module)) => module,
            Ok(None) => {
                return Err(CompetencyError::Load(format!("Module '{}' not found", id)));
            }
            Err(e @ CompetencyError::Load(_)) => return Err(e),
            Err(e) => {
                return Err(CompetencyError::Load(format!("Loading '{}' failed: {}", id, e)));
            }
        };

        if module.id != *id {
            return Err(CompetencyError::Load(format!(
                "Loader returned '{}' when asked for '{}'",
                module.id, id
            )));
        }

        Ok(module)
    }
}
