//! 运行入口
//!
//! 根据配置选择固定结果或真实的提供者，组装存储、流程和批量运行器

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::{DocumentFetcher, LlmClient};
use crate::orchestrator::{BatchRunner, RunSummary};
use crate::providers::{
    AnalysisProvider, AnalysisResult, ExtractionProvider, FallbackExtractor, FixtureAnalyzer,
    FixtureExtractor, LlmAnalyzer, PdfTextExtractor, VisionOcrExtractor,
};
use crate::store::{ContentStore, TomlStore};
use crate::utils::logging;
use crate::workflow::EnrichmentFlow;

/// PDF 文本层质量低于该值时转视觉模型 OCR
const MIN_PDF_QUALITY: f32 = 0.5;

const FIXTURE_TEXT: &str = "Résoudre l'équation";

/// 应用主结构
pub struct App {
    config: Config,
    runner: BatchRunner,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let store: Arc<dyn ContentStore> = Arc::new(TomlStore::new(&config.store_folder));
        let extractor = build_extractor(&config)?;
        let analyzer = build_analyzer(&config);

        let flow = Arc::new(EnrichmentFlow::new(
            extractor,
            analyzer,
            store.clone(),
            config.timeouts(),
        ));

        let cancel = CancellationToken::new();
        let runner = BatchRunner::new(store, flow, config.max_concurrent_items)
            .with_cancellation(cancel.clone());

        Ok(Self {
            config,
            runner,
            cancel,
        })
    }

    /// 运行一次批量补全，Ctrl-C 时不再开始新题目
    pub async fn run(&self) -> Result<RunSummary> {
        let cancel = self.cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⏹️ 收到 Ctrl-C，等待进行中的题目完成...");
                cancel.cancel();
            }
        });

        let result = self
            .runner
            .run(Some(self.config.batch_limit))
            .await
            .context("批量补全中止");
        ctrl_c.abort();

        let summary = result?;
        logging::print_final_stats(&summary, self.runner.is_cancelled());
        info!("\n日志已保存至: {}", self.config.output_log_file);
        Ok(summary)
    }
}

fn build_extractor(config: &Config) -> Result<Arc<dyn ExtractionProvider>> {
    if config.use_fixture_extraction {
        return Ok(Arc::new(FixtureExtractor::new(FIXTURE_TEXT)));
    }

    let fetcher = DocumentFetcher::new(Duration::from_secs(config.extraction_timeout_secs))
        .context("无法创建 HTTP 客户端")?;
    let pdf = Arc::new(PdfTextExtractor::new(fetcher.clone(), config.min_text_chars));
    // 转写整页题目需要更长的输出
    let vision = Arc::new(VisionOcrExtractor::new(
        llm_client(config, &config.llm_vision_model_name).with_max_tokens(4096),
        fetcher,
    ));

    Ok(Arc::new(FallbackExtractor::new(pdf, vision, MIN_PDF_QUALITY)))
}

fn build_analyzer(config: &Config) -> Arc<dyn AnalysisProvider> {
    if config.use_fixture_analysis {
        return Arc::new(FixtureAnalyzer::new(AnalysisResult {
            title: Some("Exercice".to_string()),
            summary: Some("Exercice d'entraînement".to_string()),
            keywords: vec!["exercice".to_string()],
            estimated_duration: Some(15),
            estimated_difficulty: Some(3),
            theme_ids: Vec::new(),
        }));
    }

    Arc::new(LlmAnalyzer::new(
        llm_client(config, &config.llm_model_name),
        config.llm_max_retries,
    ))
}

fn llm_client(config: &Config, model: &str) -> LlmClient {
    if config.llm_api_key.is_empty() {
        warn!("⚠️ LLM_API_KEY 未设置，模型调用可能失败");
    }
    LlmClient::new(&config.llm_api_key, &config.llm_api_base_url, model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_providers_by_default() {
        let config = Config::default();
        assert_eq!(build_extractor(&config).unwrap().name(), "fixture");
        assert_eq!(build_analyzer(&config).name(), "fixture");
    }

    #[test]
    fn test_real_providers_when_flags_off() {
        let config = Config {
            use_fixture_extraction: false,
            use_fixture_analysis: false,
            llm_api_key: "test".to_string(),
            ..Config::default()
        };
        assert_eq!(build_extractor(&config).unwrap().name(), "pdf-text+vision-ocr");
        assert_eq!(build_analyzer(&config).name(), "llm");
    }

    #[tokio::test]
    async fn test_run_against_empty_store_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("items")).unwrap();
        std::fs::write(dir.path().join("taxonomy.toml"), "themes = []\n").unwrap();
        let config = Config {
            store_folder: dir.path().to_string_lossy().into_owned(),
            ..Config::default()
        };

        let summary = App::initialize(config).unwrap().run().await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }
}
