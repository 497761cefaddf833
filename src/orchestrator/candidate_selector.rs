//! 候选题目选择器
//!
//! 只读：不加锁、不占用题目，并发运行时可能选到重叠的题目

use std::sync::Arc;

use crate::error::StoreError;
use crate::models::EnrichableItem;
use crate::store::ContentStore;

/// 单次运行的题目数量上限
pub const MAX_BATCH_LIMIT: usize = 500;

pub struct CandidateSelector {
    store: Arc<dyn ContentStore>,
}

impl CandidateSelector {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// 选择待补全的题目
    ///
    /// # 参数
    /// - `limit`: 题目上限；未给出或为 0 时使用系统上限，超过上限时截断
    ///
    /// # 返回
    /// 存储默认顺序下的 pending 题目
    pub async fn select_candidates(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<EnrichableItem>, StoreError> {
        let mut items = self.store.find_pending_items(effective_limit(limit)).await?;
        // 存储实现不可信时再过滤一次
        items.retain(EnrichableItem::is_pending);
        Ok(items)
    }
}

/// 把调用方给出的上限规整到 `1..=MAX_BATCH_LIMIT`
pub fn effective_limit(limit: Option<usize>) -> usize {
    match limit {
        Some(0) | None => MAX_BATCH_LIMIT,
        Some(n) => n.min(MAX_BATCH_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnrichmentPatch;
    use crate::store::InMemoryStore;

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(None), MAX_BATCH_LIMIT);
        assert_eq!(effective_limit(Some(0)), MAX_BATCH_LIMIT);
        assert_eq!(effective_limit(Some(5)), 5);
        assert_eq!(effective_limit(Some(10_000)), MAX_BATCH_LIMIT);
    }

    #[tokio::test]
    async fn test_selects_only_pending_items() {
        let store = Arc::new(InMemoryStore::new(
            vec![
                EnrichableItem::new("a"),
                EnrichableItem::new("b"),
                EnrichableItem::new("c"),
            ],
            vec![],
        ));
        store.update_item("b", &EnrichmentPatch::Failed).await.unwrap();

        let selector = CandidateSelector::new(store);
        let items = selector.select_candidates(Some(5)).await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_respects_limit() {
        let items = (0..10).map(|i| EnrichableItem::new(format!("ex-{}", i))).collect();
        let selector = CandidateSelector::new(Arc::new(InMemoryStore::new(items, vec![])));
        assert_eq!(selector.select_candidates(Some(3)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(InMemoryStore::new(vec![EnrichableItem::new("a")], vec![]));
        store.set_reads_unavailable(true);
        let selector = CandidateSelector::new(store);
        tokio_test::assert_err!(selector.select_candidates(None).await);
    }
}
