//! Prompt construction for keyword extraction.
//!
//! The prompt is written in Chinese because the primary platforms (Moonshot,
//! Zhipu, Hunyuan, DashScope) are tuned for it and the keywords target
//! Chinese-language blog SEO. The six dimension labels double as grouping
//! keys downstream, so they must stay stable.

use crate::ingest::ModelRecord;

/// Characters of README included in the prompt.
const README_PROMPT_CHARS: usize = 800;

/// System message sent with every extraction request.
pub const SYSTEM_PROMPT: &str =
    "你是一位专业的AI项目运营专家和SEO大师，专门负责从AI模型项目中提取高价值的关键词。";

/// The six keyword dimensions, in prompt order.
pub const DIMENSIONS: [&str; 6] = [
    "热门模型品牌",
    "核心技术架构",
    "应用场景",
    "部署集成",
    "性能规格",
    "专业领域",
];

/// Build the user prompt for one model.
///
/// `excluded` is the current high-frequency exclusion list; when non-empty an
/// exclusion block is appended instructing the model to avoid those keywords.
pub fn build_prompt(record: &ModelRecord, excluded: &[String]) -> String {
    let readme = if record.readme.is_empty() {
        "暂无README内容".to_string()
    } else if record.readme.chars().count() > README_PROMPT_CHARS {
        let cut: String = record.readme.chars().take(README_PROMPT_CHARS).collect();
        format!("{}...", cut)
    } else {
        record.readme.clone()
    };

    let tags = if record.tags.is_empty() {
        "暂无标签".to_string()
    } else {
        record.tags.join(", ")
    };

    let mut prompt = format!(
        r#"你是AI项目运营专家，你需要在模型页面中提取引流关键词以便投放到博客网站当中。

项目: {project}
URL: {url}

README内容（前800字符）：
{readme}

标签: {tags}

## 提取规则
1. 基于原文内容，提取4-8个引流关键词
2. 品牌名加"大模型"后缀：NVIDIA→NVIDIA大模型
3. 参数优化：6710亿→671B参数，25亿→2.5B参数，1060亿→106B参数
4. 禁止：许可证、镜像、版本号、无意义数字

## 6个维度
1. **热门模型品牌**: InternLM大模型、GLM大模型等
2. **核心技术架构**: Transformer、MoE架构、FP8量化等
3. **应用场景**: 文本生成、图像理解、科学计算等
4. **部署集成**: Ollama部署、Transformers、ComfyUI等
5. **性能规格**: 671B参数、128K上下文等
6. **专业领域**: 科学计算、化学分析、代码编程等

## 输出格式
直接输出JSON，不要代码块：

{{
  "keywords": [
    {{
      "keyword": "InternLM大模型",
      "dimension": "热门模型品牌",
      "reason": "知名开源大模型，搜索热度高"
    }},
    {{
      "keyword": "多模态推理",
      "dimension": "核心技术架构",
      "reason": "AI技术热点，开发者关注度高"
    }}
  ]
}}

要求：4-8个关键词，每个包含keyword、dimension、reason字段。"#,
        project = record.project_name,
        url = record.url,
        readme = readme,
        tags = tags,
    );

    if !excluded.is_empty() {
        prompt.push_str(&format!(
            r#"

## 🚫 强制排除关键词（高频词）
以下关键词已被大量使用，**严禁再次提取**：
{}

你必须提取该模型**独特的、有区分度的**关键词，避开上述所有高频词。
"#,
            excluded.join(", ")
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ModelRecord {
        ModelRecord {
            url: "https://hub.example.com/zai-org/GLM-4.6".to_string(),
            project_name: "zai-org/GLM-4.6".to_string(),
            readme: "GLM-4.6 is a large language model.".to_string(),
            tags: vec!["text-generation".to_string(), "transformers".to_string()],
        }
    }

    #[test]
    fn test_prompt_includes_record_fields() {
        let prompt = build_prompt(&sample_record(), &[]);
        assert!(prompt.contains("zai-org/GLM-4.6"));
        assert!(prompt.contains("https://hub.example.com/zai-org/GLM-4.6"));
        assert!(prompt.contains("large language model"));
        assert!(prompt.contains("text-generation, transformers"));
        assert!(!prompt.contains("强制排除"));
    }

    #[test]
    fn test_prompt_readme_truncated_with_ellipsis() {
        let mut record = sample_record();
        record.readme = "字".repeat(1000);
        let prompt = build_prompt(&record, &[]);
        let rendered = "字".repeat(README_PROMPT_CHARS) + "...";
        assert!(prompt.contains(&rendered));
        assert!(!prompt.contains(&"字".repeat(801)));
    }

    #[test]
    fn test_prompt_placeholders_for_missing_content() {
        let record = ModelRecord::bare("https://hub.example.com/o/r", "o/r");
        let prompt = build_prompt(&record, &[]);
        assert!(prompt.contains("暂无README内容"));
        assert!(prompt.contains("暂无标签"));
    }

    #[test]
    fn test_prompt_appends_exclusion_block() {
        let excluded = vec!["Transformer".to_string(), "文本生成".to_string()];
        let prompt = build_prompt(&sample_record(), &excluded);
        assert!(prompt.contains("强制排除"));
        assert!(prompt.contains("Transformer, 文本生成"));
    }
}
