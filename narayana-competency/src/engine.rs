//! Competency engine service

use crate::admission::{AdmissionController, ResourceUsage};
use crate::cache::MatchCache;
use crate::competency::{CompetencyContext, CompetencyId, CompetencyModule, CompetencyState};
use crate::config::{ConfigUpdate, ScalabilityConfig};
use crate::conflict::{Conflict, ConflictDetector, ConflictResolver, DefaultConflictResolver};
use crate::error::{CompetencyError, Result};
use crate::events::{
    system_performance, AnalyticsSnapshot, EventKind, EventLog, ScalabilityEvent, Severity,
};
use crate::install::{InstallRequest, InstallResponse, Installer};
use crate::lifecycle::{ActivationRequest, ActivationResponse, ActiveEntry, ActiveSet};
use crate::loader::{CompetencyExecutor, ExecutionContext, ModuleLoader};
use crate::mailbox::{CrossCompetencyMessage, Mailbox};
use crate::matcher::ContextMatcher;
use crate::metrics::{PerformanceMetrics, MAX_SATISFACTION, MIN_SATISFACTION};
use crate::scaling::{self, AutoScaler, ScalingDecision};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Everything guarded by the engine's single writer lock
struct EngineState {
    config: ScalabilityConfig,
    registry: crate::registry::CompetencyRegistry,
    active: ActiveSet,
    events: EventLog,
    conflicts: Vec<Conflict>,
    mailbox: Mailbox,
    closed: bool,
}

impl EngineState {
    fn record(
        &mut self,
        kind: EventKind,
        competency_id: Option<&CompetencyId>,
        data: JsonValue,
        severity: Severity,
    ) {
        self.events
            .push(ScalabilityEvent::new(kind, competency_id.cloned(), data, severity));
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(CompetencyError::Closed)
        } else {
            Ok(())
        }
    }

    /// Remove `id` from the active set and log it. False if it was not active.
    fn deactivate(&mut self, id: &CompetencyId, reason: &str) -> bool {
        let Some(entry) = self.active.remove(id) else {
            return false;
        };
        let held_for = Utc::now()
            .signed_duration_since(entry.activated_at)
            .num_milliseconds();
        self.record(
            EventKind::CompetencyDeactivated,
            Some(id),
            json!({ "reason": reason, "active_ms": held_for }),
            Severity::Info,
        );
        info!("Competency deactivated: {} ({})", id, reason);
        true
    }
}

/// Competency activation and resource scheduling engine.
///
/// Cheap to clone; clones share state. All mutations are serialized through
/// one lock so admission checks and reservations are atomic.
#[derive(Clone)]
pub struct CompetencyEngine {
    state: Arc<RwLock<EngineState>>,
    cache: Arc<MatchCache>,
    resolver: Arc<dyn ConflictResolver>,
    loader: Option<Arc<dyn ModuleLoader>>,
    scaler: Arc<Mutex<Option<AutoScaler>>>,
}

/// Non-owning engine handle held by background tasks
pub(crate) struct WeakEngine {
    state: Weak<RwLock<EngineState>>,
    cache: Weak<MatchCache>,
    resolver: Arc<dyn ConflictResolver>,
    loader: Option<Arc<dyn ModuleLoader>>,
    scaler: Weak<Mutex<Option<AutoScaler>>>,
}

impl WeakEngine {
    /// `None` once every `CompetencyEngine` handle has been dropped
    pub(crate) fn upgrade(&self) -> Option<CompetencyEngine> {
        Some(CompetencyEngine {
            state: self.state.upgrade()?,
            cache: self.cache.upgrade()?,
            resolver: self.resolver.clone(),
            loader: self.loader.clone(),
            scaler: self.scaler.upgrade()?,
        })
    }
}

impl CompetencyEngine {
    /// Create new engine
    pub fn new(config: ScalabilityConfig) -> Result<Self> {
        config.validate()?;

        let events = EventLog::new(config.event_history_cap, config.analytics_window);
        let cache = Arc::new(MatchCache::new(config.cache_capacity));

        info!(
            "Competency engine created (max concurrent: {}, strategy: {:?})",
            config.max_concurrent_competencies, config.allocation_strategy
        );

        Ok(Self {
            state: Arc::new(RwLock::new(EngineState {
                config,
                registry: crate::registry::CompetencyRegistry::new(),
                active: ActiveSet::new(),
                events,
                conflicts: Vec::new(),
                mailbox: Mailbox::new(),
                closed: false,
            })),
            cache,
            resolver: Arc::new(DefaultConflictResolver),
            loader: None,
            scaler: Arc::new(Mutex::new(None)),
        })
    }

    /// Use `loader` for [`CompetencyEngine::install_module`]
    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Replace the built-in conflict resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn ConflictResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Handle for background tasks that must not keep the engine alive
    pub(crate) fn downgrade(&self) -> WeakEngine {
        WeakEngine {
            state: Arc::downgrade(&self.state),
            cache: Arc::downgrade(&self.cache),
            resolver: self.resolver.clone(),
            loader: self.loader.clone(),
            scaler: Arc::downgrade(&self.scaler),
        }
    }

    /// Stop background work and deactivate everything. Later mutations fail.
    pub fn close(&self) {
        if let Some(scaler) = self.scaler.lock().take() {
            scaler.stop();
        }

        let mut state = self.state.write();
        if state.closed {
            return;
        }
        for id in state.active.ids() {
            state.deactivate(&id, "engine closed");
        }
        state.closed = true;
        self.cache.clear();
        info!("Competency engine closed");
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    // ---------------------------------------------------------------------
    // Registry
    // ---------------------------------------------------------------------

    /// Register a competency
    pub fn register_competency(&self, module: CompetencyModule) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_open()?;

        let id = module.id.clone();
        let summary = json!({
            "name": module.name,
            "version": module.version,
            "domain": module.domain,
            "priority": module.priority,
        });

        if let Err(e) = state.registry.register(module) {
            warn!("Competency registration rejected: {}", e);
            state.record(
                EventKind::CompetencyError,
                (!id.as_str().is_empty()).then_some(&id),
                json!({ "operation": "register", "error": e.to_string() }),
                Severity::Error,
            );
            return Err(e);
        }

        state.record(
            EventKind::CompetencyRegistered,
            Some(&id),
            summary,
            Severity::Info,
        );
        self.cache.clear();

        info!("Competency registered: {}", id);
        Ok(())
    }

    /// Unregister a competency, deactivating it first if needed.
    ///
    /// Competencies that depend on it stay registered.
    pub fn unregister_competency(&self, id: &CompetencyId) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_open()?;

        state.registry.remove(id)?;
        let dependents = state.registry.dependents_of(id);
        if !dependents.is_empty() {
            warn!(
                "Competency {} unregistered while still listed as a dependency of {:?}",
                id, dependents
            );
        }
        state.deactivate(id, "unregistered");
        state.mailbox.drop_pending(id);
        self.cache.clear();

        info!("Competency unregistered: {}", id);
        Ok(())
    }

    /// Check if a competency is registered
    pub fn is_registered(&self, id: &CompetencyId) -> bool {
        self.state.read().registry.contains(id)
    }

    /// Registered modules in registration order
    pub fn get_registry(&self) -> Vec<CompetencyModule> {
        self.state.read().registry.iter_ordered().cloned().collect()
    }

    /// Get a registered module by id
    pub fn get_competency(&self, id: &CompetencyId) -> Option<CompetencyModule> {
        self.state.read().registry.get(id).cloned()
    }

    /// `None` once unregistered (or never registered)
    pub fn state_of(&self, id: &CompetencyId) -> Option<CompetencyState> {
        let state = self.state.read();
        if state.active.contains(id) {
            Some(CompetencyState::Active)
        } else if state.registry.contains(id) {
            Some(CompetencyState::Registered)
        } else {
            None
        }
    }

    // ---------------------------------------------------------------------
    // Matching
    // ---------------------------------------------------------------------

    /// Enabled competencies triggered by `context`, highest priority first
    pub fn get_compatible_competencies(&self, context: &CompetencyContext) -> Vec<CompetencyId> {
        let state = self.state.read();

        if !state.config.enable_caching {
            return ContextMatcher::find_compatible(state.registry.iter_ordered(), context);
        }

        let key = context.match_key();
        let ttl = Duration::from_secs(state.config.cache_ttl_seconds);
        if let Some(hit) = self.cache.get(&key, ttl) {
            debug!("Match cache hit for topic '{}'", context.topic);
            return hit;
        }

        let candidates = ContextMatcher::find_compatible(state.registry.iter_ordered(), context);
        // Filled under the read lock so a concurrent registry change cannot interleave
        self.cache.put(&key, candidates.clone());
        candidates
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Admit a competency into the active set.
    ///
    /// Admission, conflict resolution and reservation happen under one write lock.
    pub fn activate_competency(&self, request: ActivationRequest) -> ActivationResponse {
        let started = Instant::now();
        let id = request.competency_id.clone();
        let mut state = self.state.write();

        if let Err(e) = state.ensure_open() {
            return ActivationResponse::failure(e.to_string(), e, started.elapsed());
        }

        let Some(module) = state.registry.get(&id).cloned() else {
            debug!("Activation of unknown competency {}", id);
            return ActivationResponse::failure(
                "Competency not found",
                CompetencyError::NotFound(id.to_string()),
                started.elapsed(),
            );
        };

        if !module.enabled {
            return ActivationResponse::failure(
                "Competency disabled",
                CompetencyError::Validation(format!("Competency '{}' is disabled", id)),
                started.elapsed(),
            );
        }

        if let Some(entry) = state.active.get(&id) {
            return ActivationResponse::activated(entry.reserved, started.elapsed());
        }

        if let Err(e) = request.required_resources.validate() {
            return ActivationResponse::failure(e.to_string(), e, started.elapsed());
        }

        // Conflict detection is pure; nothing is logged until admission passes
        let strategy = state.config.conflict_strategy;
        let policy = state.config.same_domain_policy;
        let report = {
            let active_modules = state
                .active
                .entries()
                .iter()
                .filter_map(|entry| state.registry.get(&entry.competency_id));
            let conflicts = ConflictDetector::detect(&module, active_modules, strategy);
            ConflictDetector::resolve(
                conflicts,
                &module,
                |holder| state.registry.get(holder),
                self.resolver.as_ref(),
                policy,
            )
        };

        // Preempted competencies give their reservations back on commit
        let released: Vec<&ActiveEntry> = if report.all_resolved() {
            report
                .preempt
                .iter()
                .filter_map(|p| state.active.get(p))
                .collect()
        } else {
            Vec::new()
        };
        let current = state
            .active
            .reserved_total()
            .saturating_sub(&released.iter().map(|e| e.reserved).sum::<ResourceUsage>());
        let active_count = state.active.len() - released.len();

        let decision = AdmissionController::check(
            &state.config,
            &current,
            active_count,
            &request.required_resources,
        );
        if !decision.admitted {
            warn!(
                "Activation of {} rejected: {}",
                id,
                decision.reasons.join("; ")
            );
            state.record(
                EventKind::ResourceLimitExceeded,
                Some(&id),
                json!({
                    "requested": request.required_resources,
                    "projected": decision.projected,
                    "budget": decision.budget,
                    "reasons": decision.reasons,
                }),
                Severity::Warning,
            );
            return ActivationResponse::failure(
                "Insufficient resources",
                CompetencyError::ResourceExhausted(decision.reasons.join("; ")),
                started.elapsed(),
            );
        }

        state.conflicts.extend(report.conflicts.iter().cloned());

        if !report.all_resolved() {
            let notes: Vec<String> = report
                .unresolved()
                .map(|c| c.resolution.clone().unwrap_or_else(|| c.description.clone()))
                .collect();
            warn!("Activation of {} blocked: {}", id, notes.join("; "));
            state.record(
                EventKind::CompetencyError,
                Some(&id),
                json!({ "operation": "activate", "error": "Unresolved conflicts", "conflicts": notes }),
                Severity::Warning,
            );
            return ActivationResponse::failure(
                "Unresolved conflicts",
                CompetencyError::Conflict(notes.join("; ")),
                started.elapsed(),
            )
            .with_conflicts(report.conflicts);
        }

        for preempted in &report.preempt {
            let reason = format!("preempted by {}", id);
            state.deactivate(preempted, &reason);
        }

        let reserved = request.required_resources;
        state.active.insert(id.clone(), reserved);
        if let Some(metrics) = state.registry.metrics_mut(&id) {
            metrics.record_activation(&reserved);
        }

        let execution_time = started.elapsed();
        state.record(
            EventKind::CompetencyActivated,
            Some(&id),
            json!({
                "reason": request.reason,
                "priority": request.priority,
                "reserved": reserved,
                "conflicts": report.conflicts.len(),
                "decision_us": execution_time.as_micros() as u64,
            }),
            Severity::Info,
        );
        info!(
            "Competency activated: {} ({} active, {} conflicts)",
            id,
            state.active.len(),
            report.conflicts.len()
        );

        ActivationResponse::activated(reserved, execution_time)
            .with_conflicts(report.conflicts)
            .with_preempted(report.preempt)
    }

    /// Remove a competency from the active set. False if it was not active.
    pub fn deactivate_competency(&self, id: &CompetencyId) -> bool {
        let mut state = self.state.write();
        state.deactivate(id, "requested")
    }

    /// Active competencies in activation order
    pub fn get_active_competencies(&self) -> Vec<CompetencyId> {
        self.state.read().active.ids()
    }

    /// Active competencies with their reservations
    pub fn get_reservations(&self) -> Vec<ActiveEntry> {
        self.state.read().active.entries().to_vec()
    }

    /// Sum of all active reservations
    pub fn reserved_resources(&self) -> ResourceUsage {
        self.state.read().active.reserved_total()
    }

    /// Run an active competency through `executor` and fold the outcome into its metrics.
    ///
    /// The engine lock is not held while the executor runs.
    pub async fn execute_competency(
        &self,
        id: &CompetencyId,
        context: CompetencyContext,
        executor: &dyn CompetencyExecutor,
    ) -> Result<JsonValue> {
        let inbox = {
            let mut state = self.state.write();
            state.ensure_open()?;
            if !state.registry.contains(id) {
                return Err(CompetencyError::NotFound(id.to_string()));
            }
            if !state.active.contains(id) {
                return Err(CompetencyError::Validation(format!(
                    "Competency '{}' is not active",
                    id
                )));
            }
            state.mailbox.take_pending(id)
        };

        let execution = ExecutionContext {
            competency_id: id.clone(),
            context,
            inbox,
        };

        let started = Instant::now();
        let result = executor.execute(&execution).await;
        let elapsed = started.elapsed();

        let mut state = self.state.write();
        if let Some(metrics) = state.registry.metrics_mut(id) {
            metrics.record_execution(elapsed, result.is_ok());
        }

        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("Competency {} failed: {}", id, e);
                state.record(
                    EventKind::CompetencyError,
                    Some(id),
                    json!({ "operation": "execute", "error": e.to_string() }),
                    Severity::Error,
                );
                Err(match e {
                    CompetencyError::Execution(_) => e,
                    other => CompetencyError::Execution(other.to_string()),
                })
            }
        }
    }

    // ---------------------------------------------------------------------
    // Installation
    // ---------------------------------------------------------------------

    /// Install a module and any missing dependencies through the configured loader
    pub async fn install_module(&self, request: InstallRequest) -> InstallResponse {
        let Some(loader) = self.loader.clone() else {
            return InstallResponse {
                success: false,
                module_id: request.module_id,
                dependencies_installed: Vec::new(),
                error: Some("No module loader configured".to_string()),
                elapsed: Duration::ZERO,
            };
        };
        self.install_with(request, loader.as_ref()).await
    }

    /// Install using an explicit loader
    pub async fn install_with(
        &self,
        request: InstallRequest,
        loader: &dyn ModuleLoader,
    ) -> InstallResponse {
        let timeout = {
            let state = self.state.read();
            Duration::from_millis(state.config.loader_timeout_ms)
        };
        Installer::new(self, loader, timeout, request.module_id)
            .run()
            .await
    }

    /// Remove an installed module. Same as [`CompetencyEngine::unregister_competency`].
    pub fn uninstall_module(&self, id: &CompetencyId) -> Result<()> {
        self.unregister_competency(id)
    }

    /// Log a failed install with the dependencies it left registered
    pub(crate) fn record_install_failure(
        &self,
        id: &CompetencyId,
        error: &CompetencyError,
        installed: &[CompetencyId],
    ) {
        let mut state = self.state.write();
        state.record(
            EventKind::CompetencyError,
            Some(id),
            json!({
                "operation": "install",
                "error": error.to_string(),
                "dependencies_installed": installed,
            }),
            Severity::Error,
        );
    }

    // ---------------------------------------------------------------------
    // Messaging
    // ---------------------------------------------------------------------

    /// Log a message between two registered competencies. Returns the message id.
    pub fn send_cross_competency_message(
        &self,
        sender: &CompetencyId,
        receiver: &CompetencyId,
        message: impl Into<String>,
        data: JsonValue,
        requires_response: bool,
    ) -> Result<String> {
        let mut state = self.state.write();
        state.ensure_open()?;

        for id in [sender, receiver] {
            if !state.registry.contains(id) {
                return Err(CompetencyError::NotFound(id.to_string()));
            }
        }

        let posted = state.mailbox.post(
            sender.clone(),
            receiver.clone(),
            message.into(),
            data,
            requires_response,
        );
        debug!(
            "Message {} -> {} (response required: {})",
            posted.sender, posted.receiver, posted.requires_response
        );
        Ok(posted.id.clone())
    }

    /// Drain response-requiring messages waiting for `receiver`
    pub fn take_pending_messages(&self, receiver: &CompetencyId) -> Result<Vec<CrossCompetencyMessage>> {
        let mut state = self.state.write();
        if !state.registry.contains(receiver) {
            return Err(CompetencyError::NotFound(receiver.to_string()));
        }
        Ok(state.mailbox.take_pending(receiver))
    }

    /// Every message sent, oldest first
    pub fn get_communication_log(&self) -> Vec<CrossCompetencyMessage> {
        self.state.read().mailbox.log().to_vec()
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    /// Apply a partial update. Rejected if current reservations would exceed the new budget.
    pub fn update_configuration(&self, update: ConfigUpdate) -> Result<ScalabilityConfig> {
        let mut state = self.state.write();
        state.ensure_open()?;

        let next = update.apply_to(&state.config);
        next.validate()?;

        let reserved = state.active.reserved_total();
        if state.active.len() > next.max_concurrent_competencies
            || !reserved.fits_within(&next.total_budget())
        {
            return Err(CompetencyError::Config(format!(
                "{} active competencies holding {:?} do not fit the new budget {:?}",
                state.active.len(),
                reserved,
                next.total_budget()
            )));
        }

        state.events.set_caps(next.event_history_cap, next.analytics_window);
        let stop_scaling = state.config.auto_scaling && !next.auto_scaling;
        state.config = next.clone();
        drop(state);

        self.cache.clear();
        if stop_scaling {
            self.stop_auto_scaling();
        }

        info!("Configuration updated: {:?}", next);
        Ok(next)
    }

    /// Current configuration, including auto-scaled limits
    pub fn get_configuration(&self) -> ScalabilityConfig {
        self.state.read().config.clone()
    }

    // ---------------------------------------------------------------------
    // Metrics, feedback and analytics
    // ---------------------------------------------------------------------

    /// Metrics for one competency, or for all when `id` is `None`
    pub fn get_performance_metrics(
        &self,
        id: Option<&CompetencyId>,
    ) -> HashMap<CompetencyId, PerformanceMetrics> {
        let state = self.state.read();
        match id {
            Some(id) => state
                .registry
                .metrics(id)
                .map(|m| HashMap::from([(id.clone(), m.clone())]))
                .unwrap_or_default(),
            None => state.registry.all_metrics().clone(),
        }
    }

    /// Fold a 1..=5 satisfaction score into the competency's running average
    pub fn record_user_feedback(
        &self,
        id: &CompetencyId,
        score: u8,
        comment: Option<&str>,
    ) -> Result<()> {
        if !(MIN_SATISFACTION..=MAX_SATISFACTION).contains(&score) {
            return Err(CompetencyError::Validation(format!(
                "Feedback score {} outside {}..={}",
                score, MIN_SATISFACTION, MAX_SATISFACTION
            )));
        }

        let mut state = self.state.write();
        state.ensure_open()?;
        let metrics = state
            .registry
            .metrics_mut(id)
            .ok_or_else(|| CompetencyError::NotFound(id.to_string()))?;
        metrics.record_feedback(score);

        debug!(
            "Feedback for {}: {} (now {:.2}) {}",
            id,
            score,
            metrics.user_satisfaction,
            comment.unwrap_or_default()
        );
        Ok(())
    }

    /// Snapshot of activity, utilization and per-competency metrics
    pub fn get_analytics(&self) -> AnalyticsSnapshot {
        let state = self.state.read();
        let metrics = state.registry.all_metrics();
        let utilization = state
            .active
            .reserved_total()
            .utilization_of(&state.config.total_budget());

        AnalyticsSnapshot {
            active_competencies: state.active.len(),
            total_competencies: state.registry.count(),
            system_performance: system_performance(metrics.values()),
            resource_utilization: utilization,
            allocation_strategy: state.config.allocation_strategy,
            conflict_count: state.conflicts.len(),
            competency_metrics: metrics.clone(),
            recent_events: state.events.recent(),
            generated_at: Utc::now(),
        }
    }

    /// Capped event history, oldest first
    pub fn get_event_history(&self) -> Vec<ScalabilityEvent> {
        self.state.read().events.history()
    }

    /// All conflicts recorded by admitted activation attempts
    pub fn get_conflicts(&self) -> Vec<Conflict> {
        self.state.read().conflicts.clone()
    }

    /// Subscribe to events as they are logged
    pub fn subscribe_events(&self) -> broadcast::Receiver<ScalabilityEvent> {
        self.state.read().events.subscribe()
    }

    // ---------------------------------------------------------------------
    // Auto-scaling
    // ---------------------------------------------------------------------

    /// Run one auto-scaling step. `Hold` when auto-scaling is disabled.
    pub fn evaluate_scaling(&self) -> Result<ScalingDecision> {
        let mut state = self.state.write();
        state.ensure_open()?;

        if !state.config.auto_scaling {
            return Ok(ScalingDecision::Hold);
        }

        let reserved = state.active.reserved_total();
        let active_count = state.active.len();
        let load = scaling::utilization(&state.config, active_count, &reserved);
        let decision = scaling::evaluate(&state.config, active_count, &reserved);

        let (from, to) = match decision {
            ScalingDecision::Hold => return Ok(decision),
            ScalingDecision::ScaleUp { from, to } | ScalingDecision::ScaleDown { from, to } => {
                (from, to)
            }
        };

        state.config.max_concurrent_competencies = to;
        state.record(
            EventKind::ScalingEvent,
            None,
            json!({
                "from": from,
                "to": to,
                "utilization": load,
                "active": active_count,
            }),
            Severity::Info,
        );
        info!("Max concurrent competencies scaled {} -> {}", from, to);
        Ok(decision)
    }

    /// Start periodic auto-scaling. Requires `auto_scaling` to be enabled and a tokio runtime.
    ///
    /// The task holds no strong reference; it ends when the last handle is dropped.
    pub fn start_auto_scaling(&self) -> Result<()> {
        let interval = {
            let state = self.state.read();
            state.ensure_open()?;
            if !state.config.auto_scaling {
                return Err(CompetencyError::Config(
                    "Auto-scaling is disabled in the configuration".to_string(),
                ));
            }
            Duration::from_millis(state.config.auto_scaling_policy.check_interval_ms)
        };

        let mut scaler = self.scaler.lock();
        if scaler.as_ref().is_some_and(AutoScaler::is_running) {
            return Ok(());
        }
        *scaler = Some(AutoScaler::spawn(self.downgrade(), interval));
        info!("Auto-scaling started (every {:?})", interval);
        Ok(())
    }

    /// Cancel the auto-scaling task if one is running
    pub fn stop_auto_scaling(&self) {
        if let Some(scaler) = self.scaler.lock().take() {
            scaler.stop();
        }
    }

    /// Check if the auto-scaling task is running
    pub fn is_auto_scaling(&self) -> bool {
        self.scaler
            .lock()
            .as_ref()
            .is_some_and(AutoScaler::is_running)
    }
}

impl std::fmt::Debug for CompetencyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CompetencyEngine")
            .field("registered", &state.registry.count())
            .field("active", &state.active.len())
            .field("closed", &state.closed)
            .finish()
    }
}
