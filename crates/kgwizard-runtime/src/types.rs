//! Runtime types.

use std::path::PathBuf;

use kgwizard_chat::ChatMessage;
use kgwizard_core::{Error, Result};
use kgwizard_ingest::ParseSummary;
use serde::Serialize;

pub const DEFAULT_DYNAMIC_START: usize = 1;
pub const DEFAULT_DYNAMIC_STEPS: usize = 5;
pub const DEFAULT_DYNAMIC_MAX_WORKERS: usize = 30;

/// How a batch of jobs is spread over tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum ExecutionMode {
    /// One job at a time, in input order.
    Sequential,
    /// A fixed pool of workers pulling from a shared queue.
    Static { workers: usize },
    /// Successive batches whose pool size grows from `start` to `max_workers`.
    Dynamic {
        start: usize,
        steps: usize,
        max_workers: usize,
    },
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Dynamic {
            start: DEFAULT_DYNAMIC_START,
            steps: DEFAULT_DYNAMIC_STEPS,
            max_workers: DEFAULT_DYNAMIC_MAX_WORKERS,
        }
    }
}

impl ExecutionMode {
    pub fn validate(&self) -> Result<()> {
        let zero = match *self {
            ExecutionMode::Sequential => None,
            ExecutionMode::Static { workers } => (workers == 0).then_some("workers"),
            ExecutionMode::Dynamic {
                start,
                steps,
                max_workers,
            } => [
                ("dynamic_start", start),
                ("dynamic_steps", steps),
                ("dynamic_max_workers", max_workers),
            ]
            .into_iter()
            .find(|(_, v)| *v == 0)
            .map(|(name, _)| name),
        };
        match zero {
            Some(name) => Err(Error::Config(format!("{} must be at least 1", name))),
            None => Ok(()),
        }
    }
}

/// Scheduler flags as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub no_parallel: bool,
    pub workers: Option<usize>,
    pub dynamic_start: usize,
    pub dynamic_steps: usize,
    pub dynamic_max_workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            no_parallel: false,
            workers: None,
            dynamic_start: DEFAULT_DYNAMIC_START,
            dynamic_steps: DEFAULT_DYNAMIC_STEPS,
            dynamic_max_workers: DEFAULT_DYNAMIC_MAX_WORKERS,
        }
    }
}

impl SchedulerConfig {
    /// `no_parallel` wins over `workers`, which wins over the dynamic flags.
    pub fn mode(&self) -> Result<ExecutionMode> {
        let mode = if self.no_parallel {
            ExecutionMode::Sequential
        } else if let Some(workers) = self.workers {
            ExecutionMode::Static { workers }
        } else {
            ExecutionMode::Dynamic {
                start: self.dynamic_start,
                steps: self.dynamic_steps,
                max_workers: self.dynamic_max_workers,
            }
        };
        mode.validate()?;
        Ok(mode)
    }
}

/// Result of one scheduled job.
#[derive(Debug)]
pub struct JobOutcome<T> {
    pub file: PathBuf,
    pub result: Result<T>,
}

impl<T> JobOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// What one record session produced.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub record: PathBuf,
    /// Turn files in run order.
    pub turn_files: Vec<PathBuf>,
    /// The full conversation, prompts and answers.
    pub messages: Vec<ChatMessage>,
    /// Ingestion totals when RAG is active.
    pub ingest: Option<ParseSummary>,
}
