//! `gemini-planner`: plan provider backed by Google's Gemini API.
//!
//! # Architecture
//!
//! ```text
//! PlanProvider::generate / ::help
//!     │
//!     ▼
//! prompt.rs       ← builds the plan / help prompt with its JSON contract
//!     │
//!     ▼
//! GeminiClient    ← POST {endpoint}/models/{model}:generateContent
//!     │              key check happens before any network I/O
//!     ▼
//! parse.rs        ← strips ``` fences, parses the model's JSON
//!     │
//!     ▼
//! GeneratedPlan / HelpSuggestion (positional ids, no progress)
//! ```
//!
//! Every failure is reported as a [`GeminiError`] and converted to the
//! closed [`stepwise_core::PlanError`] set at the trait boundary.

pub mod client;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod types;

pub use client::{GeminiClient, GeminiConfig, PLACEHOLDER_KEY};
pub use error::GeminiError;
