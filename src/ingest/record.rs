//! The scraped model record handed to extraction.

use serde::{Deserialize, Serialize};

/// Everything kwforge knows about one model project page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Canonical project page URL. Also the cache key.
    pub url: String,
    /// `org/repo` style project name.
    pub project_name: String,
    /// README text, possibly empty when scraping failed.
    #[serde(default)]
    pub readme: String,
    /// Page tags, possibly empty.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ModelRecord {
    /// Create a record with no scraped content yet.
    pub fn bare(url: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            project_name: project_name.into(),
            readme: String::new(),
            tags: Vec::new(),
        }
    }

    /// Whether the record carries any scraped content.
    pub fn has_content(&self) -> bool {
        !self.readme.is_empty() || !self.tags.is_empty()
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_record_has_no_content() {
        let record = ModelRecord::bare("https://example.com/org/repo", "org/repo");
        assert!(!record.has_content());

        let mut record = record;
        record.tags.push("nlp".to_string());
        assert!(record.has_content());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multibyte characters must not be split.
        assert_eq!(truncate_chars("模型提取器", 2), "模型");
    }

    #[test]
    fn test_record_json_roundtrip_with_missing_fields() {
        let json = r#"{"url": "https://example.com/a/b", "project_name": "a/b"}"#;
        let record: ModelRecord = serde_json::from_str(json).expect("defaults should fill in");
        assert_eq!(record.readme, "");
        assert!(record.tags.is_empty());
    }
}
