//! Per-platform extraction capability.
//!
//! Binds one platform's chat client into the dispatch core: prompt in,
//! validated keywords out. All extractors in a batch share one exclusion
//! queue so high-frequency keywords stop being suggested mid-run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::exclusion::ExclusionQueue;
use super::parse::parse_keywords;
use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::types::KeywordResult;
use crate::dispatch::{Capability, CapabilityError};
use crate::error::LlmError;
use crate::ingest::ModelRecord;
use crate::llm::{ChatProvider, Message};

/// Keyword extraction through one LLM platform.
pub struct PlatformExtractor {
    platform_id: String,
    client: Arc<dyn ChatProvider>,
    exclusion: Arc<ExclusionQueue>,
}

impl PlatformExtractor {
    /// Bind a chat client and the shared exclusion queue.
    pub fn new(
        platform_id: impl Into<String>,
        client: Arc<dyn ChatProvider>,
        exclusion: Arc<ExclusionQueue>,
    ) -> Self {
        Self {
            platform_id: platform_id.into(),
            client,
            exclusion,
        }
    }
}

fn map_llm_error(error: LlmError) -> CapabilityError {
    if error.is_transient() {
        CapabilityError::Transient(error.to_string())
    } else {
        CapabilityError::Permanent(error.to_string())
    }
}

#[async_trait]
impl Capability<ModelRecord, KeywordResult> for PlatformExtractor {
    async fn invoke(&self, record: &ModelRecord) -> Result<KeywordResult, CapabilityError> {
        let excluded = self.exclusion.excluded();
        let prompt = build_prompt(record, &excluded);

        debug!(
            platform = %self.platform_id,
            url = %record.url,
            excluded = excluded.len(),
            "Requesting keyword extraction"
        );

        let response = self
            .client
            .chat(vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)])
            .await
            .map_err(map_llm_error)?;

        let keywords = parse_keywords(&response).map_err(map_llm_error)?;

        self.exclusion.record(&keywords);

        debug!(
            platform = %self.platform_id,
            url = %record.url,
            keywords = keywords.len(),
            "Extraction succeeded"
        );

        Ok(KeywordResult::new(record.url.clone(), keywords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedChat {
        response: Result<String, fn() -> LlmError>,
    }

    #[async_trait]
    impl ChatProvider for CannedChat {
        async fn chat(&self, _messages: Vec<Message>) -> Result<String, LlmError> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn sample_record() -> ModelRecord {
        ModelRecord {
            url: "https://hub.example.com/zai-org/GLM-4.6".to_string(),
            project_name: "zai-org/GLM-4.6".to_string(),
            readme: "A model".to_string(),
            tags: vec![],
        }
    }

    const GOOD_RESPONSE: &str = r#"{"keywords": [
        {"keyword": "GLM大模型", "dimension": "热门模型品牌", "reason": "r"},
        {"keyword": "MoE架构", "dimension": "核心技术架构", "reason": "r"},
        {"keyword": "文本生成", "dimension": "应用场景", "reason": "r"}
    ]}"#;

    #[tokio::test]
    async fn test_invoke_parses_and_updates_exclusion() {
        let exclusion = Arc::new(ExclusionQueue::new());
        let extractor = PlatformExtractor::new(
            "moonshot",
            Arc::new(CannedChat {
                response: Ok(GOOD_RESPONSE.to_string()),
            }),
            Arc::clone(&exclusion),
        );

        let result = extractor
            .invoke(&sample_record())
            .await
            .expect("extraction should succeed");
        assert_eq!(result.model_url, "https://hub.example.com/zai-org/GLM-4.6");
        assert_eq!(result.keywords.len(), 3);
        assert_eq!(exclusion.distinct_keywords(), 3);
    }

    #[tokio::test]
    async fn test_invoke_maps_rate_limit_to_transient() {
        let extractor = PlatformExtractor::new(
            "zhipu",
            Arc::new(CannedChat {
                response: Err(|| LlmError::RateLimited("slow down".to_string())),
            }),
            Arc::new(ExclusionQueue::new()),
        );

        let error = extractor
            .invoke(&sample_record())
            .await
            .expect_err("should fail");
        assert!(matches!(error, CapabilityError::Transient(_)));
    }

    #[tokio::test]
    async fn test_invoke_maps_garbage_response_to_permanent() {
        let extractor = PlatformExtractor::new(
            "openai",
            Arc::new(CannedChat {
                response: Ok("no keywords here".to_string()),
            }),
            Arc::new(ExclusionQueue::new()),
        );

        let error = extractor
            .invoke(&sample_record())
            .await
            .expect_err("should fail");
        assert!(matches!(error, CapabilityError::Permanent(_)));
    }
}
