//! 题目补全流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整补全流程
//!
//! 流程顺序（严格串行）：
//! 1. 文本提取（已有文本时仍调用，但保留已有文本）
//! 2. 内容分析
//! 3. 主题校验（丢弃快照中不存在的主题）
//! 4. 原子保存全部字段 + completed
//!
//! 任一步失败：只把状态写成 failed（尽力而为），保留上一次成功的字段

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::EnrichmentTimeouts;
use crate::error::{EnrichError, Stage};
use crate::models::{CompletedFields, EnrichableItem, EnrichmentPatch, TaxonomySnapshot};
use crate::providers::{
    AnalysisProvider, AnalysisRequest, ExtractionProvider, ExtractionRequest,
};
use crate::store::ContentStore;
use crate::utils::logging::truncate_text;
use crate::workflow::item_ctx::ItemCtx;
use crate::workflow::taxonomy_filter::filter_theme_ids;

/// 单道题目的处理结果
#[derive(Debug)]
pub enum EnrichmentOutcome {
    /// 补全成功
    Completed {
        item_id: String,
        /// 被丢弃的主题ID（快照中不存在）
        dropped_theme_ids: Vec<String>,
    },
    /// 补全失败
    Failed {
        item_id: String,
        error: EnrichError,
        /// failed 状态是否成功写入
        status_recorded: bool,
    },
}

impl EnrichmentOutcome {
    pub fn item_id(&self) -> &str {
        match self {
            EnrichmentOutcome::Completed { item_id, .. } | EnrichmentOutcome::Failed { item_id, .. } => item_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EnrichmentOutcome::Completed { .. })
    }
}

/// 题目补全流程
///
/// - 编排单道题目的完整补全流程
/// - 只依赖能力接口（提取 / 分析 / 存储），不关心具体实现
/// - 不向上抛出单道题目的错误
pub struct EnrichmentFlow {
    extractor: Arc<dyn ExtractionProvider>,
    analyzer: Arc<dyn AnalysisProvider>,
    store: Arc<dyn ContentStore>,
    timeouts: EnrichmentTimeouts,
}

impl EnrichmentFlow {
    pub fn new(
        extractor: Arc<dyn ExtractionProvider>,
        analyzer: Arc<dyn AnalysisProvider>,
        store: Arc<dyn ContentStore>,
        timeouts: EnrichmentTimeouts,
    ) -> Self {
        Self {
            extractor,
            analyzer,
            store,
            timeouts,
        }
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    pub fn analyzer_name(&self) -> &str {
        self.analyzer.name()
    }

    /// 补全一道题目
    ///
    /// 可用于 pending 题目，也可用于重新补全 completed / failed 题目
    pub async fn enrich_one(
        &self,
        item: &EnrichableItem,
        snapshot: &TaxonomySnapshot,
    ) -> EnrichmentOutcome {
        self.run(&ItemCtx::standalone(&item.id), item, snapshot).await
    }

    pub async fn run(
        &self,
        ctx: &ItemCtx,
        item: &EnrichableItem,
        snapshot: &TaxonomySnapshot,
    ) -> EnrichmentOutcome {
        match self.try_enrich(ctx, item, snapshot).await {
            Ok(dropped_theme_ids) => {
                info!("{} ✓ 补全完成", ctx);
                EnrichmentOutcome::Completed {
                    item_id: item.id.clone(),
                    dropped_theme_ids,
                }
            }
            Err(error) => {
                warn!("{} ❌ 补全失败: {}", ctx, error);
                let status_recorded = self.record_failure(ctx, &item.id).await;
                EnrichmentOutcome::Failed {
                    item_id: item.id.clone(),
                    error,
                    status_recorded,
                }
            }
        }
    }

    /// 执行 提取 → 分析 → 校验 → 保存，返回被丢弃的主题ID
    async fn try_enrich(
        &self,
        ctx: &ItemCtx,
        item: &EnrichableItem,
        snapshot: &TaxonomySnapshot,
    ) -> Result<Vec<String>, EnrichError> {
        // ========== 1. 文本提取 ==========
        let request = ExtractionRequest::for_item(item);
        debug!("{} 🔍 {} 提取文本...", ctx, self.extractor.name());
        let extracted = bounded(
            Stage::Extract,
            self.timeouts.extraction,
            self.extractor.extract(&request),
        )
        .await?;

        // 人工整理过的文本优先，提取结果只在没有文本时写入
        let (text, new_raw_text) = match item.raw_text.as_deref() {
            Some(existing) if item.has_raw_text() => (existing.to_string(), None),
            _ => {
                let text = extracted.text.trim().to_string();
                let new_raw_text = (!text.is_empty()).then(|| text.clone());
                (text, new_raw_text)
            }
        };
        self.log_text(ctx, &text, extracted.quality);

        // ========== 2. 内容分析 ==========
        debug!("{} 🧠 {} 分析内容...", ctx, self.analyzer.name());
        let analysis_request = AnalysisRequest {
            item_id: &item.id,
            text: &text,
            available_labels: snapshot.entries(),
        };
        let analysis = bounded(
            Stage::Analyze,
            self.timeouts.analysis,
            self.analyzer.analyze(&analysis_request),
        )
        .await?;

        // ========== 3. 主题校验 ==========
        let themes = filter_theme_ids(&analysis.theme_ids, snapshot);
        if !themes.dropped.is_empty() {
            warn!(
                "{} ⚠️ 丢弃不存在的主题: {:?}",
                ctx, themes.dropped
            );
        }

        // ========== 4. 原子保存 ==========
        let patch = EnrichmentPatch::Completed(CompletedFields {
            raw_text: new_raw_text,
            title: analysis.title,
            summary: analysis.summary,
            keywords: analysis.keywords,
            estimated_duration: analysis.estimated_duration,
            estimated_difficulty: analysis.estimated_difficulty,
            theme_ids: themes.kept,
            enriched_at: Utc::now(),
        });
        bounded(
            Stage::Persist,
            self.timeouts.persist,
            self.store.update_item(&item.id, &patch),
        )
        .await?;

        Ok(themes.dropped)
    }

    /// 尽力写入 failed 状态，失败只记录日志
    async fn record_failure(&self, ctx: &ItemCtx, item_id: &str) -> bool {
        let result = bounded(
            Stage::Persist,
            self.timeouts.persist,
            self.store.update_item(item_id, &EnrichmentPatch::Failed),
        )
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                error!("{} 写入 failed 状态失败: {}", ctx, e);
                false
            }
        }
    }

    // ========== 日志辅助方法 ==========

    fn log_text(&self, ctx: &ItemCtx, text: &str, quality: Option<f32>) {
        if text.is_empty() {
            warn!("{} ⚠️ 没有可用文本，分析结果可能较弱", ctx);
        } else {
            debug!(
                "{} 文本 ({:?}): {}",
                ctx,
                quality,
                truncate_text(text, 80)
            );
        }
    }
}

/// 给外部调用加超时；超时按该阶段的普通失败处理
async fn bounded<T, E, F>(stage: Stage, limit: Duration, fut: F) -> Result<T, EnrichError>
where
    F: Future<Output = Result<T, E>>,
    EnrichError: From<E>,
{
    match timeout(limit, fut).await {
        Ok(result) => result.map_err(EnrichError::from),
        Err(_) => Err(EnrichError::Timeout {
            stage,
            secs: limit.as_secs(),
        }),
    }
}
