//! Batch summary.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ingest::ParseOutcome;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseSummary {
    pub files_total: usize,
    pub connections: usize,
    pub type_errors: usize,
    pub key_errors: usize,
    pub upsert_errors: usize,
    /// Unreadable files and files with at least one failed item.
    pub failing_files: Vec<PathBuf>,
}

impl ParseSummary {
    /// Fold one file's outcome into the totals.
    pub fn record(&mut self, file: &Path, outcome: &ParseOutcome) {
        self.connections += outcome.connections;
        self.type_errors += outcome.type_errors();
        self.key_errors += outcome.key_errors();
        self.upsert_errors += outcome.upsert_errors();
        if outcome.has_errors() {
            self.failing_files.push(file.to_path_buf());
        }
    }

    /// Merge another summary (e.g. from a parallel job) into this one.
    pub fn merge(&mut self, other: ParseSummary) {
        self.files_total += other.files_total;
        self.connections += other.connections;
        self.type_errors += other.type_errors;
        self.key_errors += other.key_errors;
        self.upsert_errors += other.upsert_errors;
        self.failing_files.extend(other.failing_files);
    }

    pub fn parse_errors(&self) -> usize {
        self.type_errors + self.key_errors
    }

    /// Items attempted: parsed connections plus parse failures.
    pub fn attempted(&self) -> usize {
        self.connections + self.parse_errors()
    }

    /// Share of attempted items that became connections; 0 when none were.
    pub fn success_ratio(&self) -> f64 {
        match self.attempted() {
            0 => 0.0,
            n => self.connections as f64 / n as f64,
        }
    }
}

impl fmt::Display for ParseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.parse_errors();
        writeln!(
            f,
            "Parsed {} out of {} files",
            self.files_total.saturating_sub(self.failing_files.len()),
            self.files_total
        )?;
        writeln!(f, "-Summary-")?;
        writeln!(f, "Connections parsed: {}/{}", self.connections, self.attempted())?;
        writeln!(f, "Total errors: {}", errors)?;
        writeln!(f, "  - Type errors: {}/{}", self.type_errors, errors)?;
        writeln!(f, "  - Key errors: {}/{}", self.key_errors, errors)?;
        writeln!(f, "Upsert errors: {}", self.upsert_errors)?;
        writeln!(f, "Performance: {:.2}%", self.success_ratio() * 100.0)?;
        writeln!(f, "-Failing files-")?;
        for file in &self.failing_files {
            writeln!(f, "{}", file.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ItemError;
    use kgwizard_schema::EntityError;

    #[test]
    fn test_ratio_of_empty_batch_is_zero() {
        assert_eq!(ParseSummary::default().success_ratio(), 0.0);
    }

    #[test]
    fn test_record_and_render() {
        let mut summary = ParseSummary {
            files_total: 2,
            ..ParseSummary::default()
        };
        summary.record(
            Path::new("ok.json"),
            &ParseOutcome {
                connections: 3,
                ..ParseOutcome::default()
            },
        );
        summary.record(
            Path::new("bad.json"),
            &ParseOutcome {
                connections: 0,
                errors: vec![ItemError::Parse(EntityError::UnknownLabel("X".into()))],
            },
        );

        assert_eq!(summary.failing_files, vec![PathBuf::from("bad.json")]);
        let text = summary.to_string();
        assert!(text.contains("Parsed 1 out of 2 files"));
        assert!(text.contains("Connections parsed: 3/4"));
        assert!(text.contains("  - Type errors: 1/1"));
        assert!(text.contains("Performance: 75.00%"));
        assert!(text.ends_with("-Failing files-\nbad.json\n"));
    }

    #[test]
    fn test_merge() {
        let mut a = ParseSummary {
            files_total: 1,
            connections: 2,
            ..ParseSummary::default()
        };
        let b = ParseSummary {
            files_total: 2,
            key_errors: 1,
            failing_files: vec![PathBuf::from("x.json")],
            ..ParseSummary::default()
        };
        a.merge(b);
        assert_eq!(a.files_total, 3);
        assert_eq!(a.attempted(), 3);
        assert_eq!(a.failing_files.len(), 1);
    }
}
