//! Append-only `errors.log` shared by concurrent jobs.

use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

/// One `{file}\t{error}` line per recorded failure.
pub struct ErrorLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a failure. Write errors are logged and otherwise ignored.
    pub fn append(&self, file: &Path, error: &dyn Display) {
        let line = format!(
            "{}\t{}\n",
            file.display(),
            error.to_string().replace(|c: char| c == '\n' || c == '\t', " ")
        );
        let _guard = self.lock.lock();
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = written {
            warn!("Cannot write {}: {}", self.path.display(), e);
        }
    }
}
