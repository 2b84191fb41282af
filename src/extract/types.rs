//! Keyword extraction result types.

use serde::{Deserialize, Serialize};

/// One extracted traffic keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    /// The keyword itself, cleaned and normalized.
    pub keyword: String,
    /// Which of the six extraction dimensions it belongs to.
    pub dimension: String,
    /// The model's one-line rationale.
    pub reason: String,
}

/// The validated keyword set for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordResult {
    /// URL of the model page the keywords came from.
    pub model_url: String,
    /// Between 3 and 8 keywords, deduplicated within the model.
    pub keywords: Vec<Keyword>,
}

impl KeywordResult {
    /// Create a result for one model.
    pub fn new(model_url: impl Into<String>, keywords: Vec<Keyword>) -> Self {
        Self {
            model_url: model_url.into(),
            keywords,
        }
    }
}
