//! Ingestion pipeline: model output files → typed connections → graph.
//!
//! Every failure below the file level is recovered and counted; a batch
//! never aborts because of one bad item or one bad file.

pub mod errorlog;
pub mod fence;
pub mod file;
pub mod ingest;
pub mod report;

pub use errorlog::ErrorLog;
pub use file::json_files;
pub use ingest::{Ingester, ItemError, ParseOutcome, ParseResult};
pub use report::ParseSummary;
