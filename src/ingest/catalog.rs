//! Catalog CSV reading and project-name normalization.
//!
//! The catalog is an export of the model directory. Only rows that passed
//! review (`audit_status == "2"`) and are public (`is_public == "1"`) with a
//! non-empty name and URL are eligible.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::record::ModelRecord;
use crate::error::IngestError;

/// One eligible catalog row.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Directory-internal project id.
    pub id: String,
    /// Project name as listed in the catalog.
    pub name: String,
    /// Project page URL.
    pub url: String,
}

impl CatalogEntry {
    /// Convert into a bare record, normalizing the project name from the URL.
    pub fn into_record(self) -> ModelRecord {
        let name = normalize_project_name(&self.url).unwrap_or(self.name);
        ModelRecord::bare(self.url, name)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(default)]
    project_id: String,
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    project_url: String,
    #[serde(default)]
    audit_status: String,
    #[serde(default)]
    is_public: String,
}

impl CatalogRow {
    fn is_eligible(&self) -> bool {
        self.audit_status == "2"
            && self.is_public == "1"
            && !self.project_name.trim().is_empty()
            && !self.project_url.trim().is_empty()
    }
}

/// Read up to `max_models` eligible entries from a catalog CSV.
pub fn read_catalog(path: &Path, max_models: usize) -> Result<Vec<CatalogEntry>, IngestError> {
    if !path.exists() {
        return Err(IngestError::CatalogNotFound(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for result in reader.deserialize::<CatalogRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Skipping malformed catalog row");
                skipped += 1;
                continue;
            }
        };

        if !row.is_eligible() {
            skipped += 1;
            continue;
        }

        entries.push(CatalogEntry {
            id: row.project_id,
            name: row.project_name,
            url: row.project_url,
        });

        if entries.len() >= max_models {
            break;
        }
    }

    info!(
        eligible = entries.len(),
        skipped,
        catalog = %path.display(),
        "Read catalog"
    );

    Ok(entries)
}

/// Derive an `org/repo` project name from a catalog URL path.
///
/// Mirror-host prefixes (`hf_mirrors`, `mirrors`) are dropped; otherwise the
/// last two path segments win. Returns `None` when the path has no usable
/// segments, in which case the catalog name stands.
pub fn normalize_project_name(url: &str) -> Option<String> {
    let path = url.split("://").nth(1).and_then(|rest| {
        let (_, path) = rest.split_once('/')?;
        Some(path)
    })?;

    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return None;
    }

    if matches!(segments[0], "hf_mirrors" | "mirrors") && segments.len() > 1 {
        return Some(segments[1..].join("/"));
    }

    if segments.len() >= 2 {
        Some(segments[segments.len() - 2..].join("/"))
    } else {
        Some(segments[0].to_string())
    }
}
