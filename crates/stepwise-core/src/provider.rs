use async_trait::async_trait;

use crate::error::PlanError;
use crate::types::{GeneratedPlan, HelpSuggestion, ImageInput, Step};

/// Everything a provider needs to suggest a way past an obstacle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpRequest {
    pub task_title: String,
    pub completed_steps: Vec<Step>,
    pub pending_steps: Vec<Step>,
    pub issue: String,
}

/// The remote service that turns descriptions into plans.
///
/// Implementations are responsible for transport, prompt wording and
/// response parsing; they must return [`PlanError::PlanFormatError`] rather
/// than partial data when a response does not have the expected shape.
#[async_trait]
pub trait PlanProvider: Send + Sync {
    async fn generate(
        &self,
        description: &str,
        image: Option<&ImageInput>,
    ) -> Result<GeneratedPlan, PlanError>;

    async fn help(&self, request: &HelpRequest) -> Result<HelpSuggestion, PlanError>;
}
