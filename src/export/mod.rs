//! Run artifact export.
//!
//! Each extraction run writes its artifacts into a timestamped directory:
//! the raw results as JSON, a Markdown analysis report, a deduplicated
//! keyword CSV, and a plain-text keyword list grouped by dimension.

pub mod report;

pub use report::{ExportedFiles, RunExporter};
