use stepwise_core::PlanError;
use thiserror::Error;

use crate::types::ApiError;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini API key is missing or still set to the placeholder")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gemini API error: {0}")]
    Api(ApiError),

    #[error("Gemini response contained no text")]
    EmptyResponse,

    #[error("Failed to parse model output: {source}\n  text: {text}")]
    Parse {
        text: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<GeminiError> for PlanError {
    fn from(e: GeminiError) -> Self {
        match e {
            GeminiError::MissingApiKey => PlanError::ProviderUnconfigured,
            GeminiError::Http(_) | GeminiError::Status { .. } | GeminiError::Api(_) => {
                PlanError::PlanUnavailable(e.to_string())
            }
            GeminiError::EmptyResponse | GeminiError::Parse { .. } => {
                PlanError::PlanFormatError(e.to_string())
            }
        }
    }
}
