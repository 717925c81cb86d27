//! The checklist state machine for a single task.
//!
//! Steps are worked through in order: a step unlocks once its predecessor is
//! complete, and un-completing a step invalidates everything after it. A
//! manual reorder switches gating off for good; the flag is saved with the
//! task.
//!
//! This module is pure state; persistence is layered on by
//! [`crate::session::TaskSession`].

use std::collections::HashSet;

use crate::error::{Result, StepwiseError};
use crate::types::{GeneratedPlan, Step, TaskRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checklist {
    task_title: String,
    steps: Vec<Step>,
    manually_reordered: bool,
}

impl Checklist {
    pub fn new(task_title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            task_title: task_title.into(),
            steps,
            manually_reordered: false,
        }
    }

    pub fn from_plan(plan: GeneratedPlan) -> Self {
        Self::new(plan.task_title, plan.steps)
    }

    /// Resume a saved checklist, including whether it was manually reordered.
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            manually_reordered: record.manually_reordered,
            ..Self::new(record.task_title.clone(), record.steps.clone())
        }
    }

    pub fn title(&self) -> &str {
        &self.task_title
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_manually_reordered(&self) -> bool {
        self.manually_reordered
    }

    pub fn find(&self, id: u64) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    // -----------------------------------------------------------------------
    // Gating
    // -----------------------------------------------------------------------

    /// Whether the step at `index` is locked for interaction.
    ///
    /// The first step is never locked, and nothing is locked once the list
    /// has been manually reordered.
    pub fn is_locked(&self, index: usize) -> bool {
        if index == 0 || self.manually_reordered {
            return false;
        }
        match self.steps.get(index - 1) {
            Some(prev) => !prev.completed,
            None => false,
        }
    }

    pub fn locked_ids(&self) -> Vec<u64> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_locked(*i))
            .map(|(_, s)| s.id)
            .collect()
    }

    pub fn completed_steps(&self) -> Vec<Step> {
        self.steps.iter().filter(|s| s.completed).cloned().collect()
    }

    pub fn pending_steps(&self) -> Vec<Step> {
        self.steps.iter().filter(|s| !s.completed).cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Flip `completed` on the step with `id`. Un-completing a step forces
    /// every later step back to incomplete. Returns false if `id` is unknown.
    pub fn toggle(&mut self, id: u64) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let completing = !self.steps[index].completed;
        self.steps[index].completed = completing;
        if !completing {
            for step in &mut self.steps[index + 1..] {
                step.completed = false;
            }
        }
        true
    }

    /// Set or clear (empty `text`) the note on a step. Returns false if `id`
    /// is unknown.
    pub fn set_note(&mut self, id: u64, text: impl Into<String>) -> bool {
        match self.steps.iter_mut().find(|s| s.id == id) {
            Some(step) => {
                step.note = text.into();
                true
            }
            None => false,
        }
    }

    /// Put the steps in the order given by `new_order` and renumber ids 1..N
    /// by position. `new_order` must name every current step exactly once.
    ///
    /// Only ids are read from `new_order`; each step's text, completion and
    /// note come from the current list, so a reorder can only permute.
    pub fn reorder(&mut self, new_order: Vec<Step>) -> Result<()> {
        let not_a_permutation = || {
            StepwiseError::ValidationRejected(
                "reorder must be a permutation of the current steps".to_string(),
            )
        };
        let proposed: HashSet<u64> = new_order.iter().map(|s| s.id).collect();
        if new_order.len() != self.steps.len() || proposed.len() != new_order.len() {
            return Err(not_a_permutation());
        }

        let steps = new_order
            .iter()
            .map(|s| self.find(s.id).cloned().ok_or_else(not_a_permutation))
            .collect::<Result<Vec<Step>>>()?;
        self.steps = steps;
        renumber(&mut self.steps);
        self.manually_reordered = true;
        Ok(())
    }

    /// Move the step at 1-based position `from` to 1-based position `to`.
    pub fn move_step(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.steps.len();
        if from == 0 || to == 0 || from > len || to > len {
            return Err(StepwiseError::ValidationRejected(format!(
                "positions must be between 1 and {len}"
            )));
        }
        let mut order = self.steps.clone();
        let step = order.remove(from - 1);
        order.insert(to - 1, step);
        self.reorder(order)
    }

    /// Append a user-authored step. Blank text is rejected.
    ///
    /// The new id is one past the largest id in use, which equals
    /// `len + 1` for a positional list and can never collide.
    pub fn insert(&mut self, text: &str) -> Result<u64> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StepwiseError::ValidationRejected(
                "step text must not be empty".to_string(),
            ));
        }
        let id = self.steps.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        self.steps.push(Step::manual(id, text));
        Ok(id)
    }

    /// Destructively replace the steps with a provider-suggested plan.
    ///
    /// Progress is discarded and ids are renumbered. An empty (or all-blank)
    /// replacement leaves the checklist untouched and returns false. Gating
    /// state is not reset.
    pub fn apply_replacement(&mut self, replacement: &[Step]) -> bool {
        let mut steps: Vec<Step> = replacement
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| Step {
                completed: false,
                is_manual: false,
                ..s.clone()
            })
            .collect();
        if steps.is_empty() {
            return false;
        }
        renumber(&mut steps);
        self.steps = steps;
        true
    }
}

fn renumber(steps: &mut [Step]) {
    for (i, step) in steps.iter_mut().enumerate() {
        step.id = i as u64 + 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
