//! Turn-file ingestion: fenced JSON → connections → graph.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kgwizard_schema::{Connection, EntityError, FailureClass, Schema};
use kgwizard_store::GraphAdapter;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errorlog::ErrorLog;
use crate::fence;
use crate::report::ParseSummary;

/// Items of one file, split by outcome. Rejected items keep their error.
#[derive(Debug, Default)]
pub struct ParseResult {
    pub connections: Vec<Connection>,
    pub type_errors: Vec<(Value, EntityError)>,
    pub key_errors: Vec<(Value, EntityError)>,
}

/// Why one item of a file did not reach the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemError {
    /// Rejected by the schema before any write.
    Parse(EntityError),
    /// Parsed, but the store refused it after the retry.
    Upsert(String),
}

impl ItemError {
    /// Schema class of a parse failure; `None` for store failures.
    pub fn class(&self) -> Option<FailureClass> {
        match self {
            ItemError::Parse(e) => Some(e.class()),
            ItemError::Upsert(_) => None,
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemError::Parse(e) => match e.class() {
                FailureClass::Type => write!(f, "type error: {}", e),
                FailureClass::Key => write!(f, "key error: {}", e),
            },
            ItemError::Upsert(msg) => write!(f, "upsert error: {}", msg),
        }
    }
}

/// Result of ingesting one file: how many connections were parsed and every
/// item that failed, type errors first, then key errors, then upserts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub connections: usize,
    pub errors: Vec<ItemError>,
}

impl ParseOutcome {
    fn count(&self, class: Option<FailureClass>) -> usize {
        self.errors.iter().filter(|e| e.class() == class).count()
    }

    pub fn type_errors(&self) -> usize {
        self.count(Some(FailureClass::Type))
    }

    pub fn key_errors(&self) -> usize {
        self.count(Some(FailureClass::Key))
    }

    pub fn upsert_errors(&self) -> usize {
        self.count(None)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parses turn files against a schema and upserts what it can.
#[derive(Clone)]
pub struct Ingester {
    schema: Arc<Schema>,
    adapter: GraphAdapter,
    error_log: Option<Arc<ErrorLog>>,
}

impl Ingester {
    pub fn new(schema: Arc<Schema>, adapter: GraphAdapter) -> Self {
        Self {
            schema,
            adapter,
            error_log: None,
        }
    }

    /// Record store failures in `log`.
    pub fn with_error_log(mut self, log: Arc<ErrorLog>) -> Self {
        self.error_log = Some(log);
        self
    }

    pub fn adapter(&self) -> &GraphAdapter {
        &self.adapter
    }

    /// Build a connection from every item; failures go to their class bucket.
    pub fn parse_or_skip(&self, items: Vec<Value>) -> ParseResult {
        let mut result = ParseResult::default();
        for item in items {
            match Connection::from_dict(&self.schema, &item) {
                Ok(connection) => result.connections.push(connection),
                Err(e) => {
                    debug!("Skipping item: {}", e);
                    match e.class() {
                        FailureClass::Type => result.type_errors.push((item, e)),
                        FailureClass::Key => result.key_errors.push((item, e)),
                    }
                }
            }
        }
        result
    }

    /// Parse one turn file and upsert its connections.
    ///
    /// `None` when the file cannot be read or holds no usable JSON block.
    pub async fn parse_and_upsert(&self, path: &Path) -> Option<ParseOutcome> {
        let items = fence::read_and_clean_file(path)?;
        let parsed = self.parse_or_skip(items);

        let mut outcome = ParseOutcome {
            connections: parsed.connections.len(),
            errors: parsed
                .type_errors
                .into_iter()
                .chain(parsed.key_errors)
                .map(|(_, e)| ItemError::Parse(e))
                .collect(),
        };

        for connection in &parsed.connections {
            let written = match self.adapter.add_connection(connection).await {
                Err(e) if e.is_transient() => {
                    debug!("Retrying connection from {}: {}", path.display(), e);
                    self.adapter.add_connection(connection).await
                }
                other => other,
            };
            if let Err(e) = written {
                warn!("Upsert failed for {}: {}", path.display(), e);
                if let Some(log) = &self.error_log {
                    log.append(path, &e);
                }
                outcome.errors.push(ItemError::Upsert(e.to_string()));
            }
        }

        debug!(
            "{}: {} connections, {} type errors, {} key errors, {} upsert errors",
            path.display(),
            outcome.connections,
            outcome.type_errors(),
            outcome.key_errors(),
            outcome.upsert_errors()
        );
        Some(outcome)
    }

    /// Ingest `files` one after another and aggregate the results.
    pub async fn parse_batch(&self, files: &[PathBuf]) -> ParseSummary {
        let mut summary = ParseSummary {
            files_total: files.len(),
            ..ParseSummary::default()
        };

        for (n, file) in files.iter().enumerate() {
            debug!("[{}/{}] {}", n + 1, files.len(), file.display());
            match self.parse_and_upsert(file).await {
                Some(outcome) => {
                    for e in &outcome.errors {
                        debug!("{}: {}", file.display(), e);
                    }
                    summary.record(file, &outcome);
                }
                None => {
                    warn!("Unable to parse {}, skipping", file.display());
                    summary.failing_files.push(file.clone());
                }
            }
        }

        info!(
            "Parsed {} files: {} connections, {} failing files",
            summary.files_total,
            summary.connections,
            summary.failing_files.len()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use kgwizard_core::{Error, Result};
    use kgwizard_schema::Properties;
    use kgwizard_store::{EdgeHandle, GraphSnapshot, GraphStore, MemoryGraph, VertexHandle};
    use serde_json::json;

    /// Refuses the first `failures` edge inserts with a store error.
    struct RefusingStore {
        inner: MemoryGraph,
        failures: usize,
        attempts: AtomicUsize,
    }

    impl RefusingStore {
        fn new(failures: usize) -> Self {
            Self {
                inner: MemoryGraph::new(),
                failures,
                attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GraphStore for RefusingStore {
        async fn find_vertex(&self, l: &str, p: &Properties) -> Result<Option<VertexHandle>> {
            self.inner.find_vertex(l, p).await
        }
        async fn insert_vertex(&self, l: &str, p: &Properties) -> Result<VertexHandle> {
            self.inner.insert_vertex(l, p).await
        }
        async fn insert_edge(
            &self,
            l: &str,
            s: &VertexHandle,
            t: &VertexHandle,
            p: &Properties,
        ) -> Result<EdgeHandle> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(Error::Store("connection reset".into()));
            }
            self.inner.insert_edge(l, s, t, p).await
        }
        async fn vertex_values(&self, l: &str, k: &str) -> Result<Vec<Value>> {
            self.inner.vertex_values(l, k).await
        }
        async fn count_vertices(&self, l: Option<&str>) -> Result<usize> {
            self.inner.count_vertices(l).await
        }
        async fn count_edges(&self, l: Option<&str>) -> Result<usize> {
            self.inner.count_edges(l).await
        }
        async fn snapshot(&self) -> Result<GraphSnapshot> {
            self.inner.snapshot().await
        }
    }

    fn ingester() -> Ingester {
        Ingester::new(
            Arc::new(Schema::load("echem").unwrap()),
            GraphAdapter::new(Arc::new(MemoryGraph::new())),
        )
    }

    fn solvent(name: &str) -> Value {
        json!({
            "source": {"label": "Reaction", "properties": {"uuid": "S1_1"}},
            "target": {"label": "Compound", "properties": {"name": name}},
            "label": "HasSolvent",
            "properties": {"value": "5", "unit": "mL"}
        })
    }

    fn fenced(items: &Value) -> String {
        format!("Sure.\n```json\n{}\n```\n", items)
    }

    #[test]
    fn test_parse_or_skip_classifies() {
        let items = vec![
            solvent("water"),
            json!({"source": {"label": "Unknown", "properties": {}},
                   "target": {"label": "Compound", "properties": {"name": "x"}}}),
            json!({"source": {"label": "Reaction", "properties": {}},
                   "target": {"label": "Compound", "properties": {"name": "x"}},
                   "label": "HasSolvent"}),
        ];
        let result = ingester().parse_or_skip(items);
        assert_eq!(result.connections.len(), 1);
        assert_eq!(result.type_errors.len(), 1);
        assert_eq!(result.key_errors.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_label_yields_one_type_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        let item = json!([{"source": {"label": "Unknown", "properties": {}},
                            "target": {"label": "Compound", "properties": {"name": "x"}}}]);
        std::fs::write(&path, fenced(&item)).unwrap();

        let ing = ingester();
        let outcome = ing.parse_and_upsert(&path).await.unwrap();
        assert_eq!(outcome.connections, 0);
        assert_eq!(outcome.type_errors(), 1);
        assert_eq!(outcome.key_errors(), 0);
        assert_eq!(
            outcome.errors,
            vec![ItemError::Parse(EntityError::UnknownLabel("Unknown".into()))]
        );
        assert_eq!(ing.adapter().stats().await.unwrap().vertex_count, 0);
    }

    #[tokio::test]
    async fn test_coerced_values_reach_the_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, fenced(&json!([solvent("water"), solvent("water")]))).unwrap();

        let ing = ingester();
        let outcome = ing.parse_and_upsert(&path).await.unwrap();
        assert_eq!(outcome.connections, 2);
        assert!(!outcome.has_errors());

        let snapshot = ing.adapter().store().snapshot().await.unwrap();
        assert_eq!(snapshot.vertices.len(), 2);
        assert_eq!(snapshot.edges.len(), 2);
        assert_eq!(snapshot.edges[0].properties["value"], json!(5.0));
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a_good.json");
        let broken = dir.path().join("b_broken.json");
        let mixed = dir.path().join("c_mixed.json");
        let missing = dir.path().join("d_missing.json");

        std::fs::write(&good, fenced(&json!([solvent("water"), solvent("MeCN")]))).unwrap();
        std::fs::write(&broken, "I could not do it.").unwrap();
        std::fs::write(
            &mixed,
            fenced(&json!([
                solvent("DMF"),
                {"source": {"label": "Nope", "properties": {}},
                 "target": {"label": "Compound", "properties": {"name": "x"}}},
                {"source": {"label": "Reaction", "properties": {"uuid": "r", "colour": "red"}},
                 "target": {"label": "Compound", "properties": {"name": "x"}},
                 "label": "HasSolvent"}
            ])),
        )
        .unwrap();

        let files = vec![good, broken.clone(), mixed.clone(), missing.clone()];
        let summary = ingester().parse_batch(&files).await;

        assert_eq!(summary.files_total, 4);
        assert_eq!(summary.connections, 3);
        assert_eq!(summary.type_errors, 1);
        assert_eq!(summary.key_errors, 1);
        assert_eq!(summary.failing_files, vec![broken, mixed, missing]);
        assert!((summary.success_ratio() - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_transient_store_error_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, fenced(&json!([solvent("water")]))).unwrap();

        let ing = Ingester::new(
            Arc::new(Schema::load("echem").unwrap()),
            GraphAdapter::new(Arc::new(RefusingStore::new(1))),
        );
        let outcome = ing.parse_and_upsert(&path).await.unwrap();

        assert_eq!(outcome.connections, 1);
        assert_eq!(outcome.upsert_errors(), 0);
        assert!(!outcome.has_errors());
        let stats = ing.adapter().stats().await.unwrap();
        assert_eq!(stats.vertex_count, 2);
        assert_eq!(stats.edge_count, 1);
    }

    #[tokio::test]
    async fn test_persistent_store_error_is_counted_and_logged_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, fenced(&json!([solvent("water")]))).unwrap();
        let log = Arc::new(ErrorLog::new(dir.path().join("errors.log")));

        let ing = Ingester::new(
            Arc::new(Schema::load("echem").unwrap()),
            GraphAdapter::new(Arc::new(RefusingStore::new(usize::MAX))),
        )
        .with_error_log(Arc::clone(&log));
        let outcome = ing.parse_and_upsert(&path).await.unwrap();

        assert_eq!(outcome.connections, 1);
        assert_eq!(outcome.upsert_errors(), 1);
        assert_eq!(
            outcome.errors,
            vec![ItemError::Upsert("Graph store error: connection reset".into())]
        );
        assert_eq!(ing.adapter().stats().await.unwrap().edge_count, 0);

        let logged = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = logged.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(&format!("{}\t", path.display())));
        assert!(lines[0].ends_with("connection reset"));
    }

    #[tokio::test]
    async fn test_outcome_keeps_each_failure_with_its_class() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(
            &path,
            fenced(&json!([
                {"source": {"label": "Reaction", "properties": {"uuid": "r", "colour": "red"}},
                 "target": {"label": "Compound", "properties": {"name": "x"}},
                 "label": "HasSolvent"},
                solvent("water"),
                {"source": {"label": "Nope", "properties": {}},
                 "target": {"label": "Compound", "properties": {"name": "x"}}}
            ])),
        )
        .unwrap();

        let outcome = ingester().parse_and_upsert(&path).await.unwrap();

        assert_eq!(outcome.connections, 1);
        let classes: Vec<_> = outcome.errors.iter().map(ItemError::class).collect();
        assert_eq!(classes, vec![Some(FailureClass::Type), Some(FailureClass::Key)]);
        assert_eq!(outcome.errors[0].to_string(), "type error: unknown label 'Nope'");
        assert!(outcome.errors[1].to_string().starts_with("key error: "));
        assert!(outcome.errors[1].to_string().contains("colour"));
    }
}
