//! `transform` and `parse`.
//!
//! Only configuration problems (schema, flags, provider keys, unreadable
//! input directory) are returned as errors. Everything that goes wrong per
//! record or per file is logged, appended to `errors.log` and reported in
//! the summary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use kgwizard_chat::{ChatGenerator, Generator, Guidelines, LLMConfig};
use kgwizard_core::OutputPaths;
use kgwizard_ingest::{json_files, ErrorLog, Ingester, ParseSummary};
use kgwizard_resolve::{validate_requests, RagResolver};
use kgwizard_runtime::{Orchestrator, RagContext, Scheduler};
use kgwizard_schema::Schema;
use kgwizard_store::{open_store, GraphAdapter};
use tracing::{error, info};

use crate::cli::{Command, GraphArgs, ParseArgs, TransformArgs};

/// Log file name used by both commands.
pub const ERROR_LOG: &str = "errors.log";

/// What a `transform` run produced.
#[derive(Debug, Default)]
pub struct TransformReport {
    pub records: usize,
    pub turn_files: usize,
    pub failed_sessions: Vec<(PathBuf, String)>,
    /// Ingestion totals when RAG was active.
    pub ingest: Option<ParseSummary>,
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Transform(args) => {
            let report = transform(&args).await?;
            print_transform(&report);
        }
        Command::Parse(args) => {
            let error_log = std::env::current_dir()?.join(ERROR_LOG);
            let summary = parse(&args, &error_log).await?;
            print!("{}", summary);
        }
    }
    Ok(())
}

fn load_schema(graph: &GraphArgs) -> anyhow::Result<Arc<Schema>> {
    let schema = Schema::load(&graph.schema)
        .with_context(|| format!("loading schema '{}'", graph.schema))?;
    Ok(Arc::new(schema))
}

fn connect(graph: &GraphArgs) -> anyhow::Result<GraphAdapter> {
    let config = graph.graph_config();
    let store = open_store(&config).context("opening graph store")?;
    Ok(GraphAdapter::new(store))
}

/// Run a generation session for every record in `args.input_dir`.
pub async fn transform(args: &TransformArgs) -> anyhow::Result<TransformReport> {
    let schema = load_schema(&args.graph)?;
    validate_requests(&schema, &args.substitutions)?;
    let scheduler = Scheduler::new(args.scheduler_config().mode()?)?;
    let files = json_files(&args.input_dir)?;

    let paths = Arc::new(
        OutputPaths::new(&args.output_dir)
            .with_context(|| format!("creating {}", args.output_dir.display()))?,
    );
    let error_log = Arc::new(ErrorLog::new(paths.error_log.clone()));

    let llm_config = LLMConfig::load(&args.llm_config);
    let generator = ChatGenerator::from_config(&llm_config, args.model.as_deref())?;
    info!("Generating with {} ({})", generator.model(), generator.provider());
    let generator: Arc<dyn Generator> = Arc::new(generator);

    let guidelines = match &args.prompt_dir {
        Some(dir) => Guidelines::from_dir(dir)
            .with_context(|| format!("reading prompt templates from {}", dir.display()))?,
        None => Guidelines::builtin(),
    };

    let mut orchestrator = Orchestrator::new(
        Arc::clone(&schema),
        generator,
        Arc::new(guidelines),
        Arc::clone(&paths),
    );
    if !args.substitutions.is_empty() {
        let adapter = connect(&args.graph)?;
        let ingester = Ingester::new(Arc::clone(&schema), adapter.clone())
            .with_error_log(Arc::clone(&error_log));
        orchestrator = orchestrator.with_rag(RagContext {
            resolver: RagResolver::new(adapter, args.substitutions.clone()),
            ingester,
        });
        info!("RAG active for {} substitutions", args.substitutions.len());
    }

    let mut report = TransformReport {
        records: files.len(),
        ingest: orchestrator.rag_active().then(ParseSummary::default),
        ..TransformReport::default()
    };

    let job = {
        let orchestrator = orchestrator.clone();
        move |file: PathBuf| {
            let orchestrator = orchestrator.clone();
            async move { orchestrator.transform_record(&file).await }
        }
    };
    for outcome in scheduler.run(files, job).await {
        match outcome.result {
            Ok(session) => {
                report.turn_files += session.turn_files.len();
                if let (Some(total), Some(part)) = (report.ingest.as_mut(), session.ingest) {
                    total.merge(part);
                }
            }
            Err(e) => {
                error_log.append(&outcome.file, &e);
                report.failed_sessions.push((outcome.file, e.to_string()));
            }
        }
    }

    info!(
        "Transformed {} records: {} turn files, {} failed sessions",
        report.records,
        report.turn_files,
        report.failed_sessions.len()
    );
    Ok(report)
}

/// Ingest every turn file in `args.input_dir`, then export a snapshot if asked.
pub async fn parse(args: &ParseArgs, error_log: &Path) -> anyhow::Result<ParseSummary> {
    let schema = load_schema(&args.graph)?;
    let files = json_files(&args.input_dir)?;
    let adapter = connect(&args.graph)?;
    let log = Arc::new(ErrorLog::new(error_log));
    let ingester = Ingester::new(schema, adapter.clone()).with_error_log(Arc::clone(&log));

    let summary = ingester.parse_batch(&files).await;
    for file in &summary.failing_files {
        log.append(file, &"file failed to parse or upsert completely");
    }

    if let Some(path) = &args.output_file {
        if let Err(e) = adapter.export_graph(path).await {
            error!("Export to {} failed: {}", path.display(), e);
        }
    }
    Ok(summary)
}

fn print_transform(report: &TransformReport) {
    println!(
        "Transformed {} out of {} records ({} turn files)",
        report.records - report.failed_sessions.len(),
        report.records,
        report.turn_files
    );
    if let Some(summary) = &report.ingest {
        print!("{}", summary);
    }
    if !report.failed_sessions.is_empty() {
        println!("-Failed sessions-");
        for (file, e) in &report.failed_sessions {
            println!("{}: {}", file.display(), e);
        }
    }
}
