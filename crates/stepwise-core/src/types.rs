use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_manual: bool,
}

impl Step {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            note: String::new(),
            is_manual: false,
        }
    }

    pub fn manual(id: u64, text: impl Into<String>) -> Self {
        Self {
            is_manual: true,
            ..Self::new(id, text)
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.completed { "x" } else { " " };
        write!(f, "[{mark}] {}. {}", self.id, self.text)
    }
}

/// Turn provider-supplied step texts into a fresh, positional step list.
///
/// Blank texts are dropped; ids are assigned 1..N in order and all progress
/// fields start empty.
pub fn fresh_steps<I, S>(texts: I) -> Vec<Step>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(i, text)| Step::new(i as u64 + 1, text))
        .collect()
}

// ---------------------------------------------------------------------------
// TaskRecord
// ---------------------------------------------------------------------------

/// One persisted checklist. `task_title` is the upsert key within the
/// collection; `id` is assigned once when the record is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub task_title: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
    /// Set once the user reorders the steps; gating stays off from then on.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub manually_reordered: bool,
}

impl TaskRecord {
    pub fn new(task_title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_title: task_title.into(),
            steps,
            created_at: Utc::now(),
            manually_reordered: false,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.completed).count()
    }

    /// Fraction of completed steps; 0 for an empty list.
    pub fn progress(&self) -> f64 {
        let total = self.steps.len();
        if total == 0 {
            return 0.0;
        }
        self.completed_count() as f64 / total as f64
    }
}

// ---------------------------------------------------------------------------
// Provider payloads
// ---------------------------------------------------------------------------

/// Image attached to a plan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// A titled, ordered plan as returned by a plan provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub task_title: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpSuggestion {
    pub message: String,
    #[serde(default)]
    pub suggested_solution: Vec<Step>,
}

impl HelpSuggestion {
    /// The replacement plan, if the provider offered a non-empty one.
    pub fn replacement(&self) -> Option<&[Step]> {
        if self.suggested_solution.is_empty() {
            None
        } else {
            Some(&self.suggested_solution)
        }
    }
}
