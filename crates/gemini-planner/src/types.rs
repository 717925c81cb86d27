//! Wire types for the `generateContent` endpoint and the JSON shapes the
//! prompts ask the model to produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use stepwise_core::types::fresh_steps;
use stepwise_core::{GeneratedPlan, HelpSuggestion};

// ─── Request ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub response_mime_type: String,
}

// ─── Response ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<i32>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ─── Model output ─────────────────────────────────────────────────────────

/// A step as the model writes it. Ids and progress fields are ignored:
/// fresh plans always start at positional ids with nothing completed.
#[derive(Debug, Deserialize)]
pub struct StepPayload {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPayload {
    #[serde(default)]
    pub task_title: String,
    pub steps: Vec<StepPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpPayload {
    pub message: String,
    #[serde(default)]
    pub suggested_solution: Vec<StepPayload>,
}

impl From<PlanPayload> for GeneratedPlan {
    fn from(p: PlanPayload) -> Self {
        GeneratedPlan {
            task_title: p.task_title.trim().to_string(),
            steps: fresh_steps(p.steps.iter().map(|s| s.text.as_str())),
        }
    }
}

impl From<HelpPayload> for HelpSuggestion {
    fn from(p: HelpPayload) -> Self {
        HelpSuggestion {
            message: p.message,
            suggested_solution: fresh_steps(p.suggested_solution.iter().map(|s| s.text.as_str())),
        }
    }
}
