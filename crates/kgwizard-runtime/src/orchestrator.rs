//! Orchestrator: one record → a sequence of generation turns.
//!
//! The first turn carries the rendered template. Each later turn asks for
//! the next optimisation run. Every answer is written to
//! `{output_dir}/{stem}_{run}.json` and, when RAG is active, ingested right
//! away so later records can reuse what this one created.

use std::path::Path;
use std::sync::Arc;

use kgwizard_chat::prompt::iteration_prompt;
use kgwizard_chat::{ChatMessage, Generator, Guidelines, Substitutions};
use kgwizard_core::{Error, OutputPaths, Result};
use kgwizard_ingest::{Ingester, ParseSummary};
use kgwizard_resolve::RagResolver;
use kgwizard_schema::Schema;
use serde_json::Value;
use tracing::{debug, info};

use crate::types::SessionReport;

/// Key of the per-run object in an input record.
pub const RUNS_KEY: &str = "Optimization Runs";

/// Retrieval side of a session: where substitutions come from and where
/// turn files go.
#[derive(Clone)]
pub struct RagContext {
    pub resolver: RagResolver,
    pub ingester: Ingester,
}

/// Everything a session needs, shared by all concurrent sessions.
#[derive(Clone)]
pub struct Orchestrator {
    schema: Arc<Schema>,
    generator: Arc<dyn Generator>,
    guidelines: Arc<Guidelines>,
    paths: Arc<OutputPaths>,
    rag: Option<RagContext>,
}

impl Orchestrator {
    pub fn new(
        schema: Arc<Schema>,
        generator: Arc<dyn Generator>,
        guidelines: Arc<Guidelines>,
        paths: Arc<OutputPaths>,
    ) -> Self {
        Self {
            schema,
            generator,
            guidelines,
            paths,
            rag: None,
        }
    }

    /// Enable RAG. Inactive resolvers (no requests) are ignored.
    pub fn with_rag(mut self, rag: RagContext) -> Self {
        if rag.resolver.is_active() {
            self.rag = Some(rag);
        }
        self
    }

    pub fn rag_active(&self) -> bool {
        self.rag.is_some()
    }

    /// Run every turn for `record`.
    ///
    /// A generation failure aborts the session; turn files already written
    /// stay on disk.
    pub async fn transform_record(&self, record: &Path) -> Result<SessionReport> {
        let raw = std::fs::read_to_string(record)?;
        let runs = optimization_runs(&raw)
            .map_err(|e| Error::Record(format!("{}: {}", record.display(), e)))?;
        let stem = record
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Record(format!("{}: no file stem", record.display())))?
            .to_string();

        info!("Transforming {} ({} runs)", stem, runs.len());

        let mut subs = match &self.rag {
            Some(rag) => rag.resolver.resolve().await,
            None => Substitutions::new(),
        };
        subs.insert("json".into(), raw);
        subs.insert("study_name".into(), stem.clone());
        subs.insert("code".into(), self.schema.describe());

        let prompt = self.guidelines.apply_substitutions(&subs, true).to_string();
        let mut report = SessionReport {
            record: record.to_path_buf(),
            turn_files: Vec::with_capacity(runs.len()),
            messages: vec![ChatMessage::user(prompt)],
            ingest: self.rag.as_ref().map(|_| ParseSummary::default()),
        };

        for (i, run) in runs.iter().enumerate() {
            if i > 0 {
                report.messages.push(ChatMessage::user(iteration_prompt(run)));
            }
            let answer = self.generator.complete(&report.messages).await?;
            let path = self.paths.turn_file(&stem, run);
            std::fs::write(&path, &answer.content)?;
            report.messages.push(answer);
            debug!("{} run {} → {}", stem, run, path.display());

            if let Some(rag) = &self.rag {
                self.ingest_turn(rag, &path, &mut report).await;
            }
            report.turn_files.push(path);
        }

        info!("Finished {}: {} turn files", stem, report.turn_files.len());
        Ok(report)
    }

    async fn ingest_turn(&self, rag: &RagContext, path: &Path, report: &mut SessionReport) {
        let Some(summary) = report.ingest.as_mut() else {
            return;
        };
        summary.files_total += 1;
        match rag.ingester.parse_and_upsert(path).await {
            Some(outcome) => summary.record(path, &outcome),
            None => summary.failing_files.push(path.to_path_buf()),
        }
    }
}

/// Run identifiers of a record, in document order.
pub fn optimization_runs(raw: &str) -> std::result::Result<Vec<String>, String> {
    let record: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let runs = record
        .get(RUNS_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| format!("no \"{}\" object", RUNS_KEY))?;
    if runs.is_empty() {
        return Err(format!("\"{}\" is empty", RUNS_KEY));
    }
    Ok(runs.keys().cloned().collect())
}
