//! Keyword JSON parsing and repair.
//!
//! Models are told to answer with a bare `{"keywords": [...]}` object, and
//! mostly do. The rest wrap it in code fences, use curly quotes, leave
//! trailing commas, or get truncated mid-array by the token budget. Parsing
//! therefore goes strict-first, then progressively repairs the text before
//! giving up.

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::types::Keyword;
use crate::error::LlmError;

/// Fewer accepted keywords than this fails the extraction.
const KEYWORDS_MIN: usize = 3;
/// More keywords than this are truncated, keeping the first ones.
const KEYWORDS_MAX: usize = 8;

#[derive(Debug, Deserialize)]
struct KeywordsEnvelope {
    #[serde(default)]
    keywords: Vec<RawKeyword>,
}

#[derive(Debug, Deserialize)]
struct RawKeyword {
    #[serde(default)]
    keyword: String,
    #[serde(default)]
    dimension: String,
    #[serde(default)]
    reason: String,
}

/// Parse a model response into validated keywords.
///
/// Accepts 3 to 8 entries; more are truncated to 8, fewer is a
/// [`LlmError::ParseError`]. Entries with empty fields are dropped, keyword
/// text is normalized, and duplicates within the response are removed.
pub fn parse_keywords(response: &str) -> Result<Vec<Keyword>, LlmError> {
    let normalized = normalize_quotes(response.trim());

    let envelope = match serde_json::from_str::<KeywordsEnvelope>(&normalized) {
        Ok(envelope) => envelope,
        Err(_) => {
            let candidate = extract_json_candidate(&normalized);
            let candidate = repair_common_errors(&candidate);

            match serde_json::from_str::<KeywordsEnvelope>(&candidate) {
                Ok(envelope) => envelope,
                // Still broken: assume the token budget cut the array short.
                Err(_) => {
                    let rebuilt = repair_truncation(&candidate);
                    serde_json::from_str::<KeywordsEnvelope>(&rebuilt).map_err(|e| {
                        warn!(error = %e, "Keyword JSON unparseable after repair");
                        LlmError::ParseError(format!("keyword JSON unparseable: {}", e))
                    })?
                }
            }
        }
    };

    let mut raw = envelope.keywords;
    if raw.len() < KEYWORDS_MIN {
        return Err(LlmError::ParseError(format!(
            "only {} keywords, at least {} required",
            raw.len(),
            KEYWORDS_MIN
        )));
    }
    if raw.len() > KEYWORDS_MAX {
        debug!(count = raw.len(), "Truncating oversized keyword list");
        raw.truncate(KEYWORDS_MAX);
    }

    let mut keywords: Vec<Keyword> = Vec::with_capacity(raw.len());
    for entry in raw {
        if entry.keyword.trim().is_empty()
            || entry.dimension.trim().is_empty()
            || entry.reason.trim().is_empty()
        {
            continue;
        }

        let cleaned = clean_keyword(&entry.keyword);
        if cleaned.is_empty() {
            continue;
        }
        if keywords.iter().any(|k| k.keyword == cleaned) {
            continue;
        }

        keywords.push(Keyword {
            keyword: cleaned,
            dimension: entry.dimension.trim().to_string(),
            reason: entry.reason.trim().to_string(),
        });
    }

    if keywords.len() < KEYWORDS_MIN {
        return Err(LlmError::ParseError(format!(
            "only {} keywords survived validation, at least {} required",
            keywords.len(),
            KEYWORDS_MIN
        )));
    }

    Ok(keywords)
}

/// Replace curly quotes, which some models emit inside JSON.
fn normalize_quotes(s: &str) -> String {
    s.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Pull the JSON object out of fences or surrounding prose.
fn extract_json_candidate(s: &str) -> String {
    if let Some(start) = s.find("```json") {
        let body = &s[start + 7..];
        let body = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        return body.trim().to_string();
    }

    match (s.find('{'), s.rfind('}')) {
        (Some(start), Some(end)) if end > start => s[start..=end].to_string(),
        _ => s.to_string(),
    }
}

/// Fix the JSON mistakes models actually make: a missing `{` before a
/// keyword entry, a trailing comma before `}]`, a missing comma between
/// adjacent objects.
fn repair_common_errors(json: &str) -> String {
    let missing_open =
        Regex::new(r#"(\},\s*\n\s*)("keyword":)"#).expect("Invalid regex for missing brace");
    let json = missing_open.replace_all(json, "${1}{${2}");

    let trailing_comma =
        Regex::new(r",(\s*\}\s*\])").expect("Invalid regex for trailing comma");
    let json = trailing_comma.replace_all(&json, "${1}");

    let missing_comma =
        Regex::new(r"(\})\s*\n\s*(\{)").expect("Invalid regex for missing comma");
    missing_comma.replace_all(&json, "${1},\n  ${2}").to_string()
}

/// Close off a response the token budget cut mid-array by keeping everything
/// up to the last complete keyword object.
fn repair_truncation(json: &str) -> String {
    let object_re =
        Regex::new(r#"\{[^{}]*"keyword"[^{}]*\}"#).expect("Invalid regex for keyword object");
    let last = match object_re.find_iter(json).last() {
        Some(m) => m,
        None => return json.to_string(),
    };

    format!("{}]}}", &json[..last.end()])
}

/// Normalize one keyword: strip parentheses, hyphenate whitespace, keep only
/// CJK, ASCII alphanumerics, hyphens and dots, then collapse runs.
fn clean_keyword(raw: &str) -> String {
    let no_parens =
        Regex::new(r"[()（）]").expect("Invalid regex for parentheses");
    let whitespace = Regex::new(r"\s+").expect("Invalid regex for whitespace");
    let disallowed =
        Regex::new(r"[^\p{Han}a-zA-Z0-9.\-]").expect("Invalid regex for disallowed chars");
    let hyphen_runs = Regex::new(r"-+").expect("Invalid regex for hyphen runs");
    let dot_runs = Regex::new(r"\.+").expect("Invalid regex for dot runs");

    let s = no_parens.replace_all(raw.trim(), "");
    let s = whitespace.replace_all(&s, "-");
    let s = disallowed.replace_all(&s, "");
    let s = hyphen_runs.replace_all(&s, "-");
    let s = dot_runs.replace_all(&s, ".");

    s.trim_matches(['-', '.']).to_string()
}
