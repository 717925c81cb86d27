use thiserror::Error;

/// Failures originating from a plan provider. Closed set: callers match on
/// the kind to decide between "fix your configuration" and "try again".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("AI service is not configured: set an API key before requesting a plan")]
    ProviderUnconfigured,

    #[error("AI service unavailable: {0}")]
    PlanUnavailable(String),

    #[error("AI service returned an unexpected response: {0}")]
    PlanFormatError(String),
}

#[derive(Debug, Error)]
pub enum StepwiseError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("another AI request is already in progress")]
    RequestPending,

    #[error("rejected: {0}")]
    ValidationRejected(String),

    #[error("step not found: {0}")]
    StepNotFound(u64),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("failed to persist tasks: {0}")]
    PersistenceFailure(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StepwiseError>;
