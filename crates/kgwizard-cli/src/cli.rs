//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kgwizard_core::config::{DEFAULT_GRAPH_ADDRESS, DEFAULT_GRAPH_NAME, DEFAULT_GRAPH_PORT};
use kgwizard_core::GraphConfig;
use kgwizard_resolve::SubstitutionRequest;
use kgwizard_runtime::{
    SchedulerConfig, DEFAULT_DYNAMIC_MAX_WORKERS, DEFAULT_DYNAMIC_START, DEFAULT_DYNAMIC_STEPS,
};

#[derive(Parser, Debug)]
#[command(name = "kgwizard", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate graph connections from experimental records with a language model
    Transform(TransformArgs),
    /// Ingest already generated turn files into the graph
    Parse(ParseArgs),
}

/// Graph endpoint and schema, shared by both commands.
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Graph server address, or `memory` for the in-process graph
    #[arg(short, long, env = "KGWIZARD_GRAPH_ADDRESS", default_value = DEFAULT_GRAPH_ADDRESS)]
    pub address: String,

    #[arg(short, long, env = "KGWIZARD_GRAPH_PORT", default_value_t = DEFAULT_GRAPH_PORT)]
    pub port: u16,

    /// Traversal source alias on the server
    #[arg(short, long = "graph_name", env = "KGWIZARD_GRAPH_NAME", default_value = DEFAULT_GRAPH_NAME)]
    pub graph_name: String,

    /// Built-in schema name or path to a schema definition file
    #[arg(long, default_value = "echem")]
    pub schema: String,
}

impl GraphArgs {
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            address: self.address.clone(),
            port: self.port,
            graph_name: self.graph_name.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TransformArgs {
    /// Directory of JSON records
    pub input_dir: PathBuf,

    /// Directory receiving one file per record and run
    #[arg(short, long = "output_dir", default_value = "./results")]
    pub output_dir: PathBuf,

    /// Process records one at a time
    #[arg(long = "no_parallel")]
    pub no_parallel: bool,

    /// Fixed worker pool size
    #[arg(short, long)]
    pub workers: Option<usize>,

    #[arg(long = "dynamic_start", default_value_t = DEFAULT_DYNAMIC_START)]
    pub dynamic_start: usize,

    #[arg(long = "dynamic_steps", default_value_t = DEFAULT_DYNAMIC_STEPS)]
    pub dynamic_steps: usize,

    #[arg(long = "dynamic_max_workers", default_value_t = DEFAULT_DYNAMIC_MAX_WORKERS)]
    pub dynamic_max_workers: usize,

    /// `token:Label` pairs filled from the graph; enables live ingestion
    #[arg(short, long, num_args = 1..)]
    pub substitutions: Vec<SubstitutionRequest>,

    /// Directory holding `header`, `instructions` and `tail` prompt files
    #[arg(long = "prompt_dir")]
    pub prompt_dir: Option<PathBuf>,

    #[arg(long = "llm_config", default_value = kgwizard_chat::config::DEFAULT_CONFIG_FILE)]
    pub llm_config: PathBuf,

    /// Model name overriding the configured one
    #[arg(long)]
    pub model: Option<String>,

    #[command(flatten)]
    pub graph: GraphArgs,
}

impl TransformArgs {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            no_parallel: self.no_parallel,
            workers: self.workers,
            dynamic_start: self.dynamic_start,
            dynamic_steps: self.dynamic_steps,
            dynamic_max_workers: self.dynamic_max_workers,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Directory of turn files
    pub input_dir: PathBuf,

    /// Write a JSON snapshot of the graph here when done
    #[arg(long = "output_file")]
    pub output_file: Option<PathBuf>,

    #[command(flatten)]
    pub graph: GraphArgs,
}
