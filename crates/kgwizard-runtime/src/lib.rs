//! Runtime: per-record generation sessions and the batch scheduler.
//!
//! [`Orchestrator`] drives one record through its generation turns.
//! [`Scheduler`] runs such jobs over many files, sequentially, with a fixed
//! worker pool, or with pools that grow batch by batch.

pub mod orchestrator;
pub mod scheduler;
pub mod types;

pub use orchestrator::{optimization_runs, Orchestrator, RagContext, RUNS_KEY};
pub use scheduler::{generate_pool_sizes, Scheduler};
pub use types::*;
