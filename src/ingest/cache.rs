//! Disk cache of scraped model records.
//!
//! A single JSON file holding every record scraped so far, keyed by URL in
//! memory. Pre-crawl saves incrementally so an interrupted run resumes where
//! it stopped instead of re-fetching pages.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::record::ModelRecord;
use crate::error::IngestError;

/// URL-keyed cache of scraped records, persisted as one JSON file.
pub struct RecordCache {
    path: PathBuf,
    records: HashMap<String, ModelRecord>,
}

impl RecordCache {
    /// Open a cache file, loading existing records when present.
    ///
    /// A missing file yields an empty cache. A corrupt file is an error so a
    /// damaged cache is never silently overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, IngestError> {
        let path = path.into();

        let records = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let loaded: Vec<ModelRecord> = serde_json::from_str(&content)
                .map_err(|e| IngestError::CorruptCache(format!("{}: {}", path.display(), e)))?;
            let mut map = HashMap::with_capacity(loaded.len());
            for record in loaded {
                map.insert(record.url.clone(), record);
            }
            info!(records = map.len(), cache = %path.display(), "Loaded record cache");
            map
        } else {
            info!(cache = %path.display(), "No cache file yet, starting empty");
            HashMap::new()
        };

        Ok(Self { path, records })
    }

    /// Whether a URL already has a cached record with scraped content.
    pub fn contains(&self, url: &str) -> bool {
        self.records
            .get(url)
            .map(|r| r.has_content())
            .unwrap_or(false)
    }

    /// Look up a record by URL.
    pub fn get(&self, url: &str) -> Option<&ModelRecord> {
        self.records.get(url)
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, record: ModelRecord) {
        self.records.insert(record.url.clone(), record);
    }

    /// Remove every cached record. Used by the force-refresh flag.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persist the cache to its file, creating parent directories as needed.
    pub fn save(&self) -> Result<(), IngestError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut records: Vec<&ModelRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));

        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// The cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a list of bare records against the cache: cached content wins,
    /// uncached records pass through unchanged.
    pub fn resolve(&self, records: Vec<ModelRecord>) -> (Vec<ModelRecord>, usize) {
        let mut hits = 0usize;
        let resolved = records
            .into_iter()
            .map(|record| match self.records.get(&record.url) {
                Some(cached) if cached.has_content() => {
                    hits += 1;
                    cached.clone()
                }
                _ => record,
            })
            .collect();

        if hits > 0 {
            info!(hits, "Resolved records from cache");
        } else {
            warn!("No cache hits, every record needs scraping");
        }

        (resolved, hits)
    }
}
