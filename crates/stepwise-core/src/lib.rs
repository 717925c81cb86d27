pub mod checklist;
pub mod config;
pub mod error;
pub mod history;
pub mod io;
pub mod paths;
pub mod provider;
pub mod save_queue;
pub mod session;
pub mod store;
pub mod types;

pub use checklist::Checklist;
pub use error::{PlanError, Result, StepwiseError};
pub use provider::{HelpRequest, PlanProvider};
pub use session::{Assistant, TaskSession};
pub use store::{FileStore, KeyValueStore, MemoryStore, TaskRepository};
pub use types::{GeneratedPlan, HelpSuggestion, ImageInput, Step, TaskRecord};
