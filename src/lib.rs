//! kwforge: SEO keyword mining from AI model hub pages.
//!
//! This library crawls model project pages for README/tag content and
//! distributes keyword-extraction jobs across multiple LLM platforms with a
//! work-stealing dispatch core.

// Core modules
pub mod cli;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod llm;

// Re-export commonly used error types
pub use error::{ExportError, IngestError, LlmError};
