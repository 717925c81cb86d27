//! Fire-and-forget persistence with FIFO ordering.
//!
//! Mutations enqueue a snapshot and return immediately. A single background
//! task applies the snapshots one at a time, so a later save can never
//! overtake an earlier one for the same title. Failures are logged and kept
//! until the next [`SaveQueue::flush`]; they never roll back in-memory state.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{Result, StepwiseError};
use crate::store::TaskRepository;
use crate::types::TaskRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub task_title: String,
    pub message: String,
}

enum Command {
    Save(TaskRecord),
    Flush(oneshot::Sender<Vec<SaveFailure>>),
}

/// Handle to the background writer. Cheap to clone; every clone feeds the
/// same queue. Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<Command>,
}

impl SaveQueue {
    pub fn spawn(repo: TaskRepository) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        tokio::spawn(async move {
            let mut failures: Vec<SaveFailure> = Vec::new();
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    Command::Save(record) => {
                        let title = record.task_title.clone();
                        let repo = repo.clone();
                        let outcome =
                            tokio::task::spawn_blocking(move || repo.upsert(&record)).await;
                        let message = match outcome {
                            Ok(Ok(())) => {
                                debug!(task = %title, "task saved");
                                continue;
                            }
                            Ok(Err(e)) => e.to_string(),
                            Err(e) => format!("save task panicked: {e}"),
                        };
                        warn!(task = %title, error = %message, "failed to save task");
                        failures.push(SaveFailure {
                            task_title: title,
                            message,
                        });
                    }
                    Command::Flush(reply) => {
                        let _ = reply.send(std::mem::take(&mut failures));
                    }
                }
            }
        });
        Self { tx }
    }

    /// Queue a snapshot for writing. Never blocks.
    pub fn enqueue(&self, record: TaskRecord) {
        let title = record.task_title.clone();
        if self.tx.send(Command::Save(record)).is_err() {
            warn!(task = %title, "save queue closed; dropping save");
        }
    }

    /// Wait until every save queued before this call has been applied and
    /// return the failures recorded since the previous flush.
    pub async fn flush(&self) -> Result<Vec<SaveFailure>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .map_err(|_| StepwiseError::PersistenceFailure("save queue closed".into()))?;
        rx.await
            .map_err(|_| StepwiseError::PersistenceFailure("save queue closed".into()))
    }
}

impl std::fmt::Debug for SaveQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveQueue").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
