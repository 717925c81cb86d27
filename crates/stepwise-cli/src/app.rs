use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use gemini_planner::{GeminiClient, GeminiConfig};
use stepwise_core::config::Config;
use stepwise_core::{Assistant, PlanError, StepwiseError, TaskRepository, TaskSession};
use tokio::runtime::Runtime;

/// Runtime plus assistant for one CLI invocation.
pub struct App {
    rt: Runtime,
    assistant: Assistant,
    api_key_env: String,
}

impl App {
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load .stepwise/config.yaml")?;
        let rt = Runtime::new().context("failed to start async runtime")?;
        let client = GeminiClient::new(GeminiConfig::from_provider(&config.provider))
            .context("failed to build Gemini client")?;

        // The save queue spawns onto the runtime, so build inside it.
        let _enter = rt.enter();
        let assistant = Assistant::new(
            Arc::new(client),
            TaskRepository::for_root(root),
            config.provider.timeout(),
        );
        drop(_enter);

        Ok(Self {
            rt,
            assistant,
            api_key_env: config.provider.api_key_env,
        })
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.rt.block_on(fut)
    }

    pub fn open(&self, title: &str) -> anyhow::Result<TaskSession> {
        self.assistant
            .open(title)
            .with_context(|| format!("no saved task titled '{title}'"))
    }

    /// Attach user-facing context to a failed plan or help request.
    pub fn explain(&self, err: StepwiseError, action: &str) -> anyhow::Error {
        match err {
            StepwiseError::Plan(PlanError::ProviderUnconfigured) => anyhow::Error::new(err)
                .context(format!("{action}: set {} to a Gemini API key", self.api_key_env)),
            other => anyhow::Error::new(other).context(action.to_string()),
        }
    }

    /// Wait for pending saves and report any that failed. Failed saves do
    /// not fail the command; the in-memory result has already been shown.
    pub fn finish(&self) -> anyhow::Result<()> {
        let failures = self.block_on(self.assistant.flush())?;
        for f in &failures {
            eprintln!("warning: could not save '{}': {}", f.task_title, f.message);
        }
        Ok(())
    }
}
