//! Generation client and prompt templates.
//!
//! Completions come from external chat APIs (OpenAI, Groq or any
//! OpenAI-compatible endpoint, and Anthropic) behind the [`Generator`]
//! trait. [`Guidelines`] assembles the first prompt of a session.

pub mod config;
pub mod prompt;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use prompt::{Guidelines, Substitutions, ITERATION_PROMPT};
pub use providers::{ChatGenerator, Generator};
pub use types::*;
