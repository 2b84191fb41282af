//! Error types for kwforge operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions
//! - Catalog ingestion and page scraping
//! - Artifact export (JSON, Markdown, CSV)
//!
//! The dispatch core defines its own errors next to its code
//! (`dispatch::DispatchError`, `dispatch::CapabilityError`).

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key for platform '{0}'")]
    MissingApiKey(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Response contained no choices")]
    EmptyResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LlmError {
    /// Whether the error is transient (worth retrying on another platform
    /// immediately, or the same platform later).
    ///
    /// Rate limits, server-side errors and network failures are transient;
    /// malformed responses and missing credentials are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimited(_) => true,
            LlmError::ApiError { code, .. } => *code >= 500 || *code == 429,
            LlmError::RequestFailed(msg) => {
                msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("connection")
                    || msg.contains("Connection refused")
            }
            _ => false,
        }
    }
}

/// Errors that can occur during catalog ingestion and page scraping.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Catalog file not found: {0}")]
    CatalogNotFound(String),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request failed for '{url}': {message}")]
    FetchFailed { url: String, message: String },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("Cache file is corrupt: {0}")]
    CorruptCache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during artifact export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No results to export")]
    NoResults,

    #[error("CSV writing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
