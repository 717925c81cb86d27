use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::store::TaskRepository;
use crate::types::TaskRecord;

/// One row of the history view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub task_title: String,
    pub completed: usize,
    pub total: usize,
    pub progress: f64,
    pub saved_at: DateTime<Utc>,
}

impl From<&TaskRecord> for HistoryEntry {
    fn from(record: &TaskRecord) -> Self {
        Self {
            id: record.id.clone(),
            task_title: record.task_title.clone(),
            completed: record.completed_count(),
            total: record.steps.len(),
            progress: record.progress(),
            saved_at: record.created_at,
        }
    }
}

/// Every saved task, most recently added first.
pub fn list(repo: &TaskRepository) -> Result<Vec<HistoryEntry>> {
    Ok(repo
        .load_all()?
        .iter()
        .rev()
        .map(HistoryEntry::from)
        .collect())
}

/// Look up a saved task by its exact title.
pub fn find(repo: &TaskRepository, title: &str) -> Result<Option<TaskRecord>> {
    repo.find_by_title(title)
}

/// Human-readable summary: "2/5 steps complete (40%)"
pub fn summarize(entry: &HistoryEntry) -> String {
    format!(
        "{}/{} steps complete ({:.0}%)",
        entry.completed,
        entry.total,
        entry.progress * 100.0
    )
}
