//! A checklist bound to persistence, and the assistant that creates them.
//!
//! [`TaskSession`] wraps a [`Checklist`] and enqueues a save after every
//! state-changing mutation. [`Assistant`] owns the plan provider, the save
//! queue and the single-request guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::checklist::Checklist;
use crate::error::{PlanError, Result, StepwiseError};
use crate::history::{self, HistoryEntry};
use crate::provider::{HelpRequest, PlanProvider};
use crate::save_queue::{SaveFailure, SaveQueue};
use crate::store::TaskRepository;
use crate::types::{fresh_steps, HelpSuggestion, ImageInput, Step, TaskRecord};

const UNTITLED: &str = "Untitled task";

// ---------------------------------------------------------------------------
// TaskSession
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TaskSession {
    record_id: String,
    checklist: Checklist,
    saves: SaveQueue,
}

impl TaskSession {
    /// Resume a persisted task, keeping its id and reorder flag.
    pub fn open(record: TaskRecord, saves: SaveQueue) -> Self {
        Self {
            checklist: Checklist::from_record(&record),
            record_id: record.id,
            saves,
        }
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub fn title(&self) -> &str {
        self.checklist.title()
    }

    pub fn steps(&self) -> &[Step] {
        self.checklist.steps()
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn toggle(&mut self, id: u64) -> bool {
        let changed = self.checklist.toggle(id);
        if changed {
            debug!(task = %self.title(), step = id, "toggled step");
            self.save();
        }
        changed
    }

    pub fn set_note(&mut self, id: u64, text: impl Into<String>) -> bool {
        let changed = self.checklist.set_note(id, text);
        if changed {
            debug!(task = %self.title(), step = id, "updated note");
            self.save();
        }
        changed
    }

    pub fn reorder(&mut self, new_order: Vec<Step>) -> Result<()> {
        self.checklist.reorder(new_order)?;
        debug!(task = %self.title(), "reordered steps");
        self.save();
        Ok(())
    }

    pub fn move_step(&mut self, from: usize, to: usize) -> Result<()> {
        self.checklist.move_step(from, to)?;
        debug!(task = %self.title(), from, to, "moved step");
        self.save();
        Ok(())
    }

    pub fn insert(&mut self, text: &str) -> Result<u64> {
        let id = self.checklist.insert(text)?;
        debug!(task = %self.title(), step = id, "inserted manual step");
        self.save();
        Ok(id)
    }

    /// Apply a confirmed replacement plan. Returns false (and saves nothing)
    /// when the replacement is empty.
    pub fn apply_replacement(&mut self, steps: &[Step]) -> bool {
        let changed = self.checklist.apply_replacement(steps);
        if changed {
            info!(task = %self.title(), steps = self.steps().len(), "applied replacement plan");
            self.save();
        }
        changed
    }

    /// The record as it would be persisted now.
    pub fn snapshot(&self) -> TaskRecord {
        TaskRecord {
            id: self.record_id.clone(),
            task_title: self.checklist.title().to_string(),
            steps: self.checklist.steps().to_vec(),
            created_at: Utc::now(),
            manually_reordered: self.checklist.is_manually_reordered(),
        }
    }

    /// Enqueue an upsert of the current state.
    pub fn save(&self) {
        self.saves.enqueue(self.snapshot());
    }

    fn help_request(&self, issue: &str) -> HelpRequest {
        HelpRequest {
            task_title: self.title().to_string(),
            completed_steps: self.checklist.completed_steps(),
            pending_steps: self.checklist.pending_steps(),
            issue: issue.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

/// Clears the pending flag on every exit path.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Assistant {
    provider: Arc<dyn PlanProvider>,
    repo: TaskRepository,
    saves: SaveQueue,
    timeout: Duration,
    pending: AtomicBool,
}

impl Assistant {
    /// Must be called inside a tokio runtime (spawns the save queue).
    pub fn new(provider: Arc<dyn PlanProvider>, repo: TaskRepository, timeout: Duration) -> Self {
        Self {
            saves: SaveQueue::spawn(repo.clone()),
            provider,
            repo,
            timeout,
            pending: AtomicBool::new(false),
        }
    }

    pub fn repository(&self) -> &TaskRepository {
        &self.repo
    }

    /// True while a plan or help request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<PendingGuard<'_>> {
        if self.pending.swap(true, Ordering::SeqCst) {
            return Err(StepwiseError::RequestPending);
        }
        Ok(PendingGuard(&self.pending))
    }

    async fn with_timeout<T, F>(&self, call: F) -> Result<T>
    where
        F: std::future::Future<Output = std::result::Result<T, PlanError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(error = %e, "plan provider failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(
                    "plan provider timed out after {}s",
                    self.timeout.as_secs_f32()
                );
                Err(PlanError::PlanUnavailable(format!(
                    "no response within {}s",
                    self.timeout.as_secs_f32()
                ))
                .into())
            }
        }
    }

    /// Ask the provider for a new plan and start a session for it.
    ///
    /// Nothing is persisted unless the provider succeeds.
    pub async fn generate_plan(
        &self,
        description: &str,
        image: Option<ImageInput>,
    ) -> Result<TaskSession> {
        let description = description.trim();
        if description.is_empty() && image.is_none() {
            return Err(StepwiseError::ValidationRejected(
                "describe the task or attach an image".to_string(),
            ));
        }

        let _guard = self.begin()?;
        let plan = self
            .with_timeout(self.provider.generate(description, image.as_ref()))
            .await?;

        let steps = fresh_steps(plan.steps.iter().map(|s| s.text.as_str()));
        if steps.is_empty() {
            return Err(PlanError::PlanFormatError("plan contains no steps".to_string()).into());
        }
        let title = [plan.task_title.trim(), description]
            .into_iter()
            .find(|t| !t.is_empty())
            .unwrap_or(UNTITLED);

        info!(task = %title, steps = steps.len(), "generated plan");
        let session = TaskSession::open(TaskRecord::new(title, steps), self.saves.clone());
        session.save();
        Ok(session)
    }

    /// Ask the provider how to get past `issue`. The suggestion is returned
    /// to the caller and never applied here.
    pub async fn request_help(&self, session: &TaskSession, issue: &str) -> Result<HelpSuggestion> {
        let issue = issue.trim();
        if issue.is_empty() {
            return Err(StepwiseError::ValidationRejected(
                "describe what you are stuck on".to_string(),
            ));
        }

        let _guard = self.begin()?;
        let request = session.help_request(issue);
        self.with_timeout(self.provider.help(&request)).await
    }

    /// Open a saved task by its exact title.
    pub fn open(&self, title: &str) -> Result<TaskSession> {
        let record = history::find(&self.repo, title)?
            .ok_or_else(|| StepwiseError::TaskNotFound(title.to_string()))?;
        Ok(TaskSession::open(record, self.saves.clone()))
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        history::list(&self.repo)
    }

    /// Wait for queued saves; see [`SaveQueue::flush`].
    pub async fn flush(&self) -> Result<Vec<SaveFailure>> {
        self.saves.flush().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStore;
    use crate::types::GeneratedPlan;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Provider returning canned responses and recording help requests.
    struct StubProvider {
        plan: std::result::Result<GeneratedPlan, PlanError>,
        help: std::result::Result<HelpSuggestion, PlanError>,
        seen: Mutex<Vec<HelpRequest>>,
    }

    impl StubProvider {
        fn with_plan(plan: std::result::Result<GeneratedPlan, PlanError>) -> Self {
            Self {
                plan,
                help: Ok(HelpSuggestion {
                    message: "Use a smaller pot".to_string(),
                    suggested_solution: vec![],
                }),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PlanProvider for StubProvider {
        async fn generate(
            &self,
            _description: &str,
            _image: Option<&ImageInput>,
        ) -> std::result::Result<GeneratedPlan, PlanError> {
            self.plan.clone()
        }

        async fn help(
            &self,
            request: &HelpRequest,
        ) -> std::result::Result<HelpSuggestion, PlanError> {
            self.seen.lock().unwrap().push(request.clone());
            self.help.clone()
        }
    }

    /// Provider that blocks until released.
    struct GatedProvider {
        release: Notify,
    }

    #[async_trait]
    impl PlanProvider for GatedProvider {
        async fn generate(
            &self,
            _description: &str,
            _image: Option<&ImageInput>,
        ) -> std::result::Result<GeneratedPlan, PlanError> {
            self.release.notified().await;
            Ok(egg_plan())
        }

        async fn help(
            &self,
            _request: &HelpRequest,
        ) -> std::result::Result<HelpSuggestion, PlanError> {
            self.release.notified().await;
            Err(PlanError::PlanUnavailable("released".into()))
        }
    }

    fn egg_plan() -> GeneratedPlan {
        GeneratedPlan {
            task_title: "Boil an egg".to_string(),
            steps: vec![Step::new(1, "Fill pot"), Step::new(2, "Boil water")],
        }
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(StepwiseError::PersistenceFailure("disk full".into()))
        }
    }

    fn assistant(provider: impl PlanProvider + 'static) -> (Assistant, TaskRepository) {
        let repo = TaskRepository::in_memory();
        let assistant = Assistant::new(Arc::new(provider), repo.clone(), Duration::from_secs(5));
        (assistant, repo)
    }

    #[tokio::test]
    async fn boil_an_egg_gating_scenario() {
        let (assistant, repo) = assistant(StubProvider::with_plan(Ok(egg_plan())));
        let mut session = assistant.generate_plan("Boil an egg", None).await.unwrap();

        assert_eq!(session.title(), "Boil an egg");
        assert_eq!(session.checklist().locked_ids(), vec![2]);

        session.toggle(1);
        assert!(session.checklist().locked_ids().is_empty());

        session.toggle(1);
        assert!(!session.steps()[1].completed);
        assert_eq!(session.checklist().locked_ids(), vec![2]);

        assert!(assistant.flush().await.unwrap().is_empty());
        let saved = repo.find_by_title("Boil an egg").unwrap().unwrap();
        assert_eq!(saved.id, session.record_id());
        assert!(saved.steps.iter().all(|s| !s.completed));
    }

    #[tokio::test]
    async fn manual_insert_into_two_step_list() {
        let (assistant, repo) = assistant(StubProvider::with_plan(Ok(egg_plan())));
        let mut session = assistant.generate_plan("Boil an egg", None).await.unwrap();

        let id = session.insert("Add salt").unwrap();
        assert_eq!(session.steps().len(), 3);
        let added = session.checklist().find(id).unwrap();
        assert!(added.is_manual);
        assert!(!added.completed);

        assistant.flush().await.unwrap();
        assert_eq!(repo.find_by_title("Boil an egg").unwrap().unwrap().steps.len(), 3);
    }

    #[tokio::test]
    async fn unconfigured_provider_creates_nothing() {
        let (assistant, repo) =
            assistant(StubProvider::with_plan(Err(PlanError::ProviderUnconfigured)));
        let err = assistant.generate_plan("Boil an egg", None).await.unwrap_err();
        assert!(matches!(
            err,
            StepwiseError::Plan(PlanError::ProviderUnconfigured)
        ));
        assert!(!assistant.is_pending());

        assistant.flush().await.unwrap();
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_description_never_reaches_provider() {
        let (assistant, _repo) = assistant(StubProvider::with_plan(Ok(egg_plan())));
        let err = assistant.generate_plan("   ", None).await.unwrap_err();
        assert!(matches!(err, StepwiseError::ValidationRejected(_)));
    }

    #[tokio::test]
    async fn image_only_request_uses_provider_title() {
        let (assistant, _repo) = assistant(StubProvider::with_plan(Ok(egg_plan())));
        let image = ImageInput::new(vec![0xff, 0xd8], "image/jpeg");
        let session = assistant.generate_plan("", Some(image)).await.unwrap();
        assert_eq!(session.title(), "Boil an egg");
    }

    #[tokio::test]
    async fn blank_provider_title_falls_back_to_description() {
        let mut plan = egg_plan();
        plan.task_title = "  ".to_string();
        let (assistant, _repo) = assistant(StubProvider::with_plan(Ok(plan)));
        let session = assistant.generate_plan(" Soft egg ", None).await.unwrap();
        assert_eq!(session.title(), "Soft egg");
    }

    #[tokio::test]
    async fn plan_without_steps_is_a_format_error() {
        let plan = GeneratedPlan {
            task_title: "Empty".to_string(),
            steps: vec![Step::new(1, "   ")],
        };
        let (assistant, repo) = assistant(StubProvider::with_plan(Ok(plan)));
        let err = assistant.generate_plan("Empty", None).await.unwrap_err();
        assert!(matches!(
            err,
            StepwiseError::Plan(PlanError::PlanFormatError(_))
        ));
        assistant.flush().await.unwrap();
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn generated_plan_is_normalized() {
        let mut plan = egg_plan();
        plan.steps[0].completed = true;
        plan.steps[0].note = "stale".to_string();
        plan.steps[1].id = 1;
        let (assistant, _repo) = assistant(StubProvider::with_plan(Ok(plan)));
        let session = assistant.generate_plan("Boil an egg", None).await.unwrap();
        let ids: Vec<u64> = session.steps().iter().map(|s| s.id).collect();
        assert_eq!(ids, [1, 2]);
        assert!(session.steps().iter().all(|s| !s.completed && s.note.is_empty()));
    }

    #[tokio::test]
    async fn help_sends_progress_split_and_does_not_apply() {
        let provider = Arc::new(StubProvider {
            help: Ok(HelpSuggestion {
                message: "Try a kettle".to_string(),
                suggested_solution: vec![Step::new(1, "Boil kettle"), Step::new(2, "Pour")],
            }),
            ..StubProvider::with_plan(Ok(egg_plan()))
        });
        let repo = TaskRepository::in_memory();
        let assistant = Assistant::new(provider.clone(), repo, Duration::from_secs(5));
        let mut session = assistant.generate_plan("Boil an egg", None).await.unwrap();
        session.toggle(1);

        let suggestion = assistant
            .request_help(&session, "No stove")
            .await
            .unwrap();
        assert_eq!(suggestion.message, "Try a kettle");
        assert_eq!(session.steps()[0].text, "Fill pot");

        {
            let seen = provider.seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].task_title, "Boil an egg");
            assert_eq!(seen[0].completed_steps.len(), 1);
            assert_eq!(seen[0].pending_steps.len(), 1);
            assert_eq!(seen[0].issue, "No stove");
        }

        let replacement = suggestion.replacement().unwrap().to_vec();
        assert!(session.apply_replacement(&replacement));
        assert_eq!(session.steps()[0].text, "Boil kettle");
        assert!(session.steps().iter().all(|s| !s.completed));
    }

    #[tokio::test]
    async fn blank_issue_is_rejected() {
        let (assistant, _repo) = assistant(StubProvider::with_plan(Ok(egg_plan())));
        let session = assistant.generate_plan("Boil an egg", None).await.unwrap();
        let err = assistant.request_help(&session, " ").await.unwrap_err();
        assert!(matches!(err, StepwiseError::ValidationRejected(_)));
    }

    #[tokio::test]
    async fn empty_replacement_saves_nothing() {
        let (assistant, repo) = assistant(StubProvider::with_plan(Ok(egg_plan())));
        let mut session = assistant.generate_plan("Boil an egg", None).await.unwrap();
        assistant.flush().await.unwrap();
        let before = repo.find_by_title("Boil an egg").unwrap().unwrap();

        assert!(!session.apply_replacement(&[]));
        assistant.flush().await.unwrap();
        assert_eq!(repo.find_by_title("Boil an egg").unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn second_request_while_pending_is_refused() {
        let provider = Arc::new(GatedProvider {
            release: Notify::new(),
        });
        let assistant = Arc::new(Assistant::new(
            provider.clone(),
            TaskRepository::in_memory(),
            Duration::from_secs(5),
        ));

        let first = {
            let assistant = assistant.clone();
            tokio::spawn(async move { assistant.generate_plan("Boil an egg", None).await })
        };
        while !assistant.is_pending() {
            tokio::task::yield_now().await;
        }

        let err = assistant.generate_plan("Fry an egg", None).await.unwrap_err();
        assert!(matches!(err, StepwiseError::RequestPending));

        provider.release.notify_one();
        let session = first.await.unwrap().unwrap();
        assert_eq!(session.title(), "Boil an egg");
        assert!(!assistant.is_pending());
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_unavailable() {
        let provider = Arc::new(GatedProvider {
            release: Notify::new(),
        });
        let assistant = Assistant::new(
            provider,
            TaskRepository::in_memory(),
            Duration::from_millis(50),
        );
        let err = assistant.generate_plan("Boil an egg", None).await.unwrap_err();
        assert!(matches!(
            err,
            StepwiseError::Plan(PlanError::PlanUnavailable(_))
        ));
        assert!(!assistant.is_pending());
    }

    #[tokio::test]
    async fn open_resumes_saved_task_with_gating() {
        let (assistant, _repo) = assistant(StubProvider::with_plan(Ok(egg_plan())));
        assistant.generate_plan("Boil an egg", None).await.unwrap();
        assistant.flush().await.unwrap();

        let reopened = assistant.open("Boil an egg").unwrap();
        assert!(!reopened.checklist().is_manually_reordered());
        assert_eq!(reopened.checklist().locked_ids(), vec![2]);
    }

    #[tokio::test]
    async fn reorder_stays_unlocked_after_reopening() {
        let (assistant, repo) = assistant(StubProvider::with_plan(Ok(egg_plan())));
        let mut session = assistant.generate_plan("Boil an egg", None).await.unwrap();
        session.move_step(2, 1).unwrap();
        assert!(session.checklist().locked_ids().is_empty());
        assistant.flush().await.unwrap();

        let mut reopened = assistant.open("Boil an egg").unwrap();
        assert_eq!(reopened.record_id(), session.record_id());
        assert_eq!(reopened.steps()[0].text, "Boil water");
        assert!(reopened.checklist().is_manually_reordered());
        assert!(reopened.checklist().locked_ids().is_empty());

        // Replacing the plan keeps the flag; only a new plan starts gated.
        let replacement = [Step::new(1, "Use kettle"), Step::new(2, "Pour")];
        assert!(reopened.apply_replacement(&replacement));
        assistant.flush().await.unwrap();
        assert!(assistant.open("Boil an egg").unwrap().checklist().locked_ids().is_empty());

        let fresh = assistant.generate_plan("Boil an egg", None).await.unwrap();
        assert_eq!(fresh.checklist().locked_ids(), vec![2]);

        assert!(matches!(
            assistant.open("Fry an egg"),
            Err(StepwiseError::TaskNotFound(_))
        ));
        assert_eq!(assistant.history().unwrap().len(), repo.load_all().unwrap().len());
    }

    #[tokio::test]
    async fn failed_saves_are_reported_and_keep_state() {
        let repo = TaskRepository::new(Arc::new(BrokenStore));
        let assistant = Assistant::new(
            Arc::new(StubProvider::with_plan(Ok(egg_plan()))),
            repo,
            Duration::from_secs(5),
        );
        let mut session = assistant.generate_plan("Boil an egg", None).await.unwrap();
        assert!(session.toggle(1));

        let failures = assistant.flush().await.unwrap();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|f| f.task_title == "Boil an egg"));
        assert!(failures[1].message.contains("disk full"));

        assert!(session.steps()[0].completed);
        assert!(session.checklist().locked_ids().is_empty());
        assert!(assistant.flush().await.unwrap().is_empty());
    }
}
