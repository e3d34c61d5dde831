//! Error types for narayana-competency

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompetencyError {
    /// Malformed module, duplicate id, missing dependency, bad request values
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Competency not found: {0}")]
    NotFound(String),

    #[error("Insufficient resources: {0}")]
    ResourceExhausted(String),

    #[error("Unresolved conflicts: {0}")]
    Conflict(String),

    /// Loader failure or a loader that produced an unusable module
    #[error("Load error: {0}")]
    Load(String),

    #[error("Loader timed out after {timeout_ms}ms for '{module_id}'")]
    Timeout { module_id: String, timeout_ms: u64 },

    #[error("Circular dependency: {0}")]
    CircularDependency(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Engine closed")]
    Closed,
}

impl From<toml::de::Error> for CompetencyError {
    fn from(err: toml::de::Error) -> Self {
        CompetencyError::Config(format!("TOML error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, CompetencyError>;
