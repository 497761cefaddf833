//! 批量补全运行器 - 编排层
//!
//! ## 职责
//!
//! 1. **主题快照**：每次运行只取一次，所有题目共享（只读）
//! 2. **候选选择**：委托 `CandidateSelector`
//! 3. **并发控制**：Semaphore 限制同时处理的题目数量
//! 4. **故障隔离**：单道题目的错误 / panic 只计入失败，不中断本批
//! 5. **协作取消**：取消后不再开始新题目，已开始的题目照常完成
//! 6. **统计汇总**：attempted / succeeded / failed
//!
//! 只有批次级的准备工作（主题快照、候选选择）失败才会中止运行

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{EnrichableItem, TaxonomySnapshot};
use crate::orchestrator::candidate_selector::{effective_limit, CandidateSelector};
use crate::store::ContentStore;
use crate::utils::logging;
use crate::workflow::{EnrichmentFlow, EnrichmentOutcome, ItemCtx};

/// 单次运行的汇总
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 实际开始处理的题目数
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    fn record_failure(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }
}

/// 批量运行器
pub struct BatchRunner {
    store: Arc<dyn ContentStore>,
    selector: CandidateSelector,
    flow: Arc<EnrichmentFlow>,
    max_concurrent: usize,
    cancel: CancellationToken,
}

impl BatchRunner {
    pub fn new(store: Arc<dyn ContentStore>, flow: Arc<EnrichmentFlow>, max_concurrent: usize) -> Self {
        Self {
            selector: CandidateSelector::new(store.clone()),
            store,
            flow,
            max_concurrent: max_concurrent.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// 使用外部的取消令牌（例如绑定 Ctrl-C）
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 执行一次批量补全
    ///
    /// # 参数
    /// - `limit`: 题目上限，规则见 `CandidateSelector::select_candidates`
    ///
    /// # 返回
    /// 运行汇总；主题快照或候选选择失败时返回错误
    pub async fn run(&self, limit: Option<usize>) -> AppResult<RunSummary> {
        logging::log_startup(
            effective_limit(limit),
            self.max_concurrent,
            self.flow.extractor_name(),
            self.flow.analyzer_name(),
        );

        let snapshot = Arc::new(self.store.taxonomy_snapshot().await.map_err(AppError::Taxonomy)?);
        let candidates = self
            .selector
            .select_candidates(limit)
            .await
            .map_err(AppError::Selection)?;

        if candidates.is_empty() {
            logging::log_no_candidates();
            return Ok(RunSummary::default());
        }
        logging::log_candidates_loaded(candidates.len(), snapshot.len());

        Ok(self.process_all(candidates, snapshot).await)
    }

    async fn process_all(
        &self,
        candidates: Vec<EnrichableItem>,
        snapshot: Arc<TaxonomySnapshot>,
    ) -> RunSummary {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let total = candidates.len();
        let mut handles = Vec::with_capacity(total);

        for (idx, item) in candidates.into_iter().enumerate() {
            let ctx = ItemCtx::new(item.id.clone(), idx + 1, total);

            // 等待空位；等待期间被取消则不再开始新题目
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                warn!(
                    "⏹️ 运行已取消，剩余 {} 道题目保持 pending",
                    total - idx
                );
                break;
            };

            let flow = self.flow.clone();
            let snapshot = snapshot.clone();
            let item_id = item.id.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                flow.run(&ctx, &item, &snapshot).await
            });
            handles.push((item_id, handle));
        }

        let mut summary = RunSummary::default();
        let (ids, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();

        for (item_id, joined) in ids.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(outcome) if outcome.is_success() => summary.record_success(),
                Ok(outcome @ EnrichmentOutcome::Failed {
                    status_recorded: false,
                    ..
                }) => {
                    warn!("题目 {} 失败且 failed 状态未写入，保持原状态", outcome.item_id());
                    summary.record_failure();
                }
                Ok(_) => summary.record_failure(),
                Err(e) => {
                    error!("题目 {} 任务执行失败: {}", item_id, e);
                    summary.record_failure();
                }
            }
        }

        info!(
            "✓ 本批完成: 成功 {}/{}",
            summary.succeeded, summary.attempted
        );
        summary
    }
}
