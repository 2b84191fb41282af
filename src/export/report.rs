//! Artifact writers for one extraction run.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::dispatch::BatchStats;
use crate::error::ExportError;
use crate::extract::KeywordResult;
use crate::ingest::catalog::normalize_project_name;

/// Paths of the artifacts one run produced.
#[derive(Debug)]
pub struct ExportedFiles {
    pub results_json: PathBuf,
    pub report_md: PathBuf,
    pub keywords_csv: PathBuf,
    pub keywords_txt: PathBuf,
}

/// One CSV row: a keyword attributed to its project.
#[derive(Debug, Serialize)]
struct KeywordRow<'a> {
    url: &'a str,
    project: String,
    keyword: &'a str,
}

/// Writes all artifacts of a run into one timestamped directory.
pub struct RunExporter {
    run_dir: PathBuf,
}

impl RunExporter {
    /// Create a run directory under `output_root`, named by start time.
    pub fn create(output_root: &Path) -> Result<Self, ExportError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let run_dir = output_root.join(format!("run_{}", timestamp));
        fs::create_dir_all(&run_dir)?;
        info!(dir = %run_dir.display(), "Created run directory");
        Ok(Self { run_dir })
    }

    /// Use an existing directory. Used in tests.
    pub fn at(run_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_dir: run_dir.into(),
        }
    }

    /// The run directory.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write every artifact for the given results.
    pub fn export_all(
        &self,
        results: &[KeywordResult],
        stats: &BatchStats,
    ) -> Result<ExportedFiles, ExportError> {
        if results.is_empty() {
            return Err(ExportError::NoResults);
        }

        let files = ExportedFiles {
            results_json: self.run_dir.join("keywords.json"),
            report_md: self.run_dir.join("report.md"),
            keywords_csv: self.run_dir.join("keywords.csv"),
            keywords_txt: self.run_dir.join("keywords.txt"),
        };

        write_results_json(&files.results_json, results)?;
        write_markdown_report(&files.report_md, results, stats)?;
        write_keywords_csv(&files.keywords_csv, results)?;
        write_keywords_txt(&files.keywords_txt, results)?;

        info!(
            dir = %self.run_dir.display(),
            models = results.len(),
            keywords = results.iter().map(|r| r.keywords.len()).sum::<usize>(),
            "Exported run artifacts"
        );

        Ok(files)
    }
}

/// Raw results, pretty-printed JSON.
fn write_results_json(path: &Path, results: &[KeywordResult]) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json)?;
    Ok(())
}

/// Global keyword deduplication: case-insensitive, first occurrence wins.
/// Returns `(url, project, keyword)` rows in result order.
fn dedup_rows(results: &[KeywordResult]) -> Vec<KeywordRow<'_>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();

    for result in results {
        let project =
            normalize_project_name(&result.model_url).unwrap_or_else(|| result.model_url.clone());

        for kw in &result.keywords {
            if seen.insert(kw.keyword.to_lowercase()) {
                rows.push(KeywordRow {
                    url: &result.model_url,
                    project: project.clone(),
                    keyword: &kw.keyword,
                });
            }
        }
    }

    rows
}

/// Deduplicated keyword CSV with `url, project, keyword` columns.
fn write_keywords_csv(path: &Path, results: &[KeywordResult]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in dedup_rows(results) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Keywords grouped by dimension, deduplicated and sorted within each group.
fn keywords_by_dimension(results: &[KeywordResult]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for result in results {
        for kw in &result.keywords {
            groups
                .entry(kw.dimension.clone())
                .or_default()
                .push(kw.keyword.clone());
        }
    }
    for keywords in groups.values_mut() {
        keywords.sort();
        keywords.dedup();
    }
    groups
}

/// Markdown analysis report: batch statistics, per-platform counters,
/// dimension distribution, keyword lists, per-model details.
fn write_markdown_report(
    path: &Path,
    results: &[KeywordResult],
    stats: &BatchStats,
) -> Result<(), ExportError> {
    let total_keywords: usize = results.iter().map(|r| r.keywords.len()).sum();
    let dedup_keywords = dedup_rows(results).len();
    let mut report = String::new();

    report.push_str("# 模型关键词提取分析报告\n\n## 概览统计\n\n");
    report.push_str(&format!("- **输入模型数**: {}\n", stats.total_items));
    report.push_str(&format!("- **成功提取模型数**: {}\n", stats.successes));
    report.push_str(&format!("- **全平台失败模型数**: {}\n", stats.exhausted));
    if stats.expired > 0 {
        report.push_str(&format!("- **超时未完成模型数**: {}\n", stats.expired));
    }
    report.push_str(&format!(
        "- **成功率**: {:.1}%\n",
        stats.success_rate() * 100.0
    ));
    report.push_str(&format!("- **原始关键词总数**: {}\n", total_keywords));
    report.push_str(&format!("- **去重后关键词总数**: {}\n", dedup_keywords));
    report.push_str(&format!(
        "- **批次耗时**: {:.1}秒\n",
        stats.elapsed.as_secs_f64()
    ));
    report.push_str(&format!(
        "- **生成时间**: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    report.push_str("\n## 平台统计\n\n| 平台 | 成功 | 失败 | 平均耗时 |\n|------|------|------|----------|\n");
    let mut platforms: Vec<_> = stats.platforms.iter().collect();
    platforms.sort_by(|a, b| b.1.successes.cmp(&a.1.successes).then(a.0.cmp(b.0)));
    for (platform, counters) in platforms {
        report.push_str(&format!(
            "| {} | {} | {} | {:.1}秒 |\n",
            platform,
            counters.successes,
            counters.failures,
            counters.avg_duration().as_secs_f64()
        ));
    }

    let groups = keywords_by_dimension(results);

    report.push_str("\n## 维度分布\n\n| 维度 | 关键词数量 | 占比 |\n|------|------------|------|\n");
    let mut dimension_counts: HashMap<&str, usize> = HashMap::new();
    for result in results {
        for kw in &result.keywords {
            *dimension_counts.entry(kw.dimension.as_str()).or_insert(0) += 1;
        }
    }
    let mut by_count: Vec<_> = dimension_counts.iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (dimension, count) in by_count {
        report.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            dimension,
            count,
            *count as f64 / total_keywords as f64 * 100.0
        ));
    }

    report.push_str("\n## 所有关键词列表\n");
    for (dimension, keywords) in &groups {
        report.push_str(&format!("\n### {} ({}个)\n\n", dimension, keywords.len()));
        for chunk in keywords.chunks(5) {
            let line: Vec<String> = chunk.iter().map(|kw| format!("**{}**", kw)).collect();
            report.push_str(&format!("- {}\n", line.join(" • ")));
        }
    }

    report.push_str("\n## 详细结果\n");
    for result in results {
        let name = normalize_project_name(&result.model_url)
            .unwrap_or_else(|| result.model_url.clone());
        report.push_str(&format!("\n### {}\n\n**URL**: {}\n\n**关键词列表**:\n\n", name, result.model_url));
        for kw in &result.keywords {
            report.push_str(&format!(
                "- **{}** ({}): {}\n",
                kw.keyword, kw.dimension, kw.reason
            ));
        }
    }

    fs::write(path, report)?;
    Ok(())
}

/// Plain-text keyword list grouped by dimension, with summary statistics.
fn write_keywords_txt(path: &Path, results: &[KeywordResult]) -> Result<(), ExportError> {
    let groups = keywords_by_dimension(results);
    let mut content = String::from("所有关键词列表\n");
    content.push_str(&"=".repeat(50));
    content.push_str("\n\n");

    for (dimension, keywords) in &groups {
        content.push_str(&format!("{} ({}个)\n", dimension, keywords.len()));
        content.push_str(&"-".repeat(30));
        content.push('\n');
        for chunk in keywords.chunks(8) {
            content.push_str(&chunk.join(" • "));
            content.push('\n');
        }
        content.push('\n');
    }

    let total_keywords: usize = results.iter().map(|r| r.keywords.len()).sum();
    let unique_keywords: usize = groups.values().map(|kws| kws.len()).sum();

    content.push_str("统计信息\n");
    content.push_str(&"=".repeat(50));
    content.push('\n');
    content.push_str(&format!("总模型数: {}\n", results.len()));
    content.push_str(&format!("关键词总数: {}\n", total_keywords));
    content.push_str(&format!("去重后关键词数: {}\n", unique_keywords));
    content.push_str(&format!(
        "平均每模型关键词数: {:.1}\n",
        total_keywords as f64 / results.len() as f64
    ));

    fs::write(path, content)?;
    Ok(())
}
