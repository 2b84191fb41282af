//! Platform discovery from the environment.
//!
//! Each supported platform is enabled by the presence of its
//! `<PLATFORM>_API_KEY` variable; `<PLATFORM>_BASE_URL` and
//! `<PLATFORM>_MODEL` override the built-in defaults. The dispatch core
//! receives the resulting list as plain values and never reads the
//! environment itself.

use std::env;

use tracing::info;

use super::client::ChatClient;

/// Built-in platform table: id, env prefix, default base URL, default model.
const PLATFORM_DEFAULTS: &[(&str, &str, &str, &str)] = &[
    (
        "moonshot",
        "MOONSHOT",
        "https://api.moonshot.cn/v1",
        "kimi-k2-0905-preview",
    ),
    (
        "dashscope",
        "DASHSCOPE",
        "https://dashscope.aliyuncs.com/compatible-mode/v1",
        "qwen-plus",
    ),
    (
        "openai",
        "OPENAI",
        "https://api.openai.com/v1",
        "gpt-3.5-turbo",
    ),
    (
        "zhipu",
        "ZHIPU",
        "https://open.bigmodel.cn/api/paas/v4",
        "glm-4",
    ),
    ("qiniu", "QINIU", "https://openai.qiniu.com/v1", "gpt-oss-120b"),
    (
        "hunyuan",
        "HUNYUAN",
        "https://api.hunyuan.cloud.tencent.com/v1",
        "hunyuan-turbos-latest",
    ),
];

/// Resolved configuration for one enabled platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Stable platform identifier ("moonshot", "zhipu", ...).
    pub id: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier to request.
    pub model: String,
    /// Bearer token.
    pub api_key: String,
    /// Vendor-specific request fields, flattened into each request body.
    pub extra_body: Option<serde_json::Value>,
}

impl PlatformConfig {
    /// Build a chat client bound to this platform.
    pub fn build_client(&self) -> ChatClient {
        let client = ChatClient::new(&self.base_url, &self.api_key, &self.model);
        match &self.extra_body {
            Some(extra) => client.with_extra_body(extra.clone()),
            None => client,
        }
    }
}

/// The set of platforms enabled by the current environment.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    platforms: Vec<PlatformConfig>,
}

impl PlatformRegistry {
    /// Discover enabled platforms from environment variables.
    ///
    /// A platform is enabled when its `<PLATFORM>_API_KEY` is set and
    /// non-empty. `<PLATFORM>_BASE_URL` and `<PLATFORM>_MODEL` override the
    /// defaults. Hunyuan additionally carries the `enable_enhancement`
    /// request extension its API expects.
    pub fn from_env() -> Self {
        let mut platforms = Vec::new();

        for &(id, prefix, default_base_url, default_model) in PLATFORM_DEFAULTS {
            let api_key = match env::var(format!("{}_API_KEY", prefix)) {
                Ok(key) if !key.trim().is_empty() => key,
                _ => continue,
            };

            let base_url = env::var(format!("{}_BASE_URL", prefix))
                .unwrap_or_else(|_| default_base_url.to_string());
            let model =
                env::var(format!("{}_MODEL", prefix)).unwrap_or_else(|_| default_model.to_string());

            let extra_body = if id == "hunyuan" {
                Some(serde_json::json!({"enable_enhancement": true}))
            } else {
                None
            };

            platforms.push(PlatformConfig {
                id: id.to_string(),
                base_url,
                model,
                api_key,
                extra_body,
            });
        }

        for platform in &platforms {
            info!(
                platform = %platform.id,
                model = %platform.model,
                "Platform enabled"
            );
        }

        Self { platforms }
    }

    /// Construct a registry from explicit configs. Used in tests.
    pub fn from_configs(platforms: Vec<PlatformConfig>) -> Self {
        Self { platforms }
    }

    /// The enabled platforms, in table order.
    pub fn platforms(&self) -> &[PlatformConfig] {
        &self.platforms
    }

    /// Number of enabled platforms.
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    /// Whether no platform is enabled.
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_table_covers_known_platforms() {
        let ids: Vec<&str> = PLATFORM_DEFAULTS.iter().map(|&(id, ..)| id).collect();
        assert_eq!(
            ids,
            vec!["moonshot", "dashscope", "openai", "zhipu", "qiniu", "hunyuan"]
        );
    }

    #[test]
    fn test_build_client_carries_extra_body() {
        let config = PlatformConfig {
            id: "hunyuan".to_string(),
            base_url: "https://api.hunyuan.cloud.tencent.com/v1".to_string(),
            model: "hunyuan-turbos-latest".to_string(),
            api_key: "sk-test".to_string(),
            extra_body: Some(serde_json::json!({"enable_enhancement": true})),
        };
        let client = config.build_client();
        assert_eq!(client.model(), "hunyuan-turbos-latest");
    }

    #[test]
    fn test_registry_from_configs() {
        let registry = PlatformRegistry::from_configs(vec![PlatformConfig {
            id: "zhipu".to_string(),
            base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
            model: "glm-4".to_string(),
            api_key: "k".to_string(),
            extra_body: None,
        }]);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert_eq!(registry.platforms()[0].id, "zhipu");
    }
}
