//! Keyword extraction: prompt construction, response parsing, and the
//! per-platform extractor that plugs into the dispatch core.
//!
//! One [`PlatformExtractor`] wraps one platform's chat client. The dispatch
//! core drives it through the `Capability` trait with scraped model records
//! and gets back validated keyword sets. All extractors share one
//! [`ExclusionQueue`] so keywords that go stale through overuse stop being
//! extracted mid-batch.

pub mod exclusion;
pub mod extractor;
pub mod parse;
pub mod prompt;
pub mod types;

pub use exclusion::ExclusionQueue;
pub use extractor::PlatformExtractor;
pub use parse::parse_keywords;
pub use prompt::build_prompt;
pub use types::{Keyword, KeywordResult};
