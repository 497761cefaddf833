use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::ContentStore;
use crate::error::StoreError;
use crate::models::{EnrichableItem, EnrichmentPatch, TaxonomyEntry, TaxonomySnapshot};

/// 内存中的内容存储
///
/// 用于测试和本地演示；可以注入读写故障
#[derive(Default)]
pub struct InMemoryStore {
    items: RwLock<Vec<EnrichableItem>>,
    taxonomy: RwLock<Vec<TaxonomyEntry>>,
    failing_updates: RwLock<HashSet<String>>,
    reads_unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new(items: Vec<EnrichableItem>, taxonomy: Vec<TaxonomyEntry>) -> Self {
        Self {
            items: RwLock::new(items),
            taxonomy: RwLock::new(taxonomy),
            ..Default::default()
        }
    }

    pub async fn insert(&self, item: EnrichableItem) {
        self.items.write().await.push(item);
    }

    /// 删除一个主题（模拟管理员在运行期间删除主题）
    pub async fn remove_theme(&self, id: &str) {
        self.taxonomy.write().await.retain(|entry| entry.id != id);
    }

    /// 之后对该题目的所有更新都会失败
    pub async fn fail_updates_for(&self, id: impl Into<String>) {
        self.failing_updates.write().await.insert(id.into());
    }

    /// 让候选查询和主题查询失败
    pub fn set_reads_unavailable(&self, unavailable: bool) {
        self.reads_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn snapshot_items(&self) -> Vec<EnrichableItem> {
        self.items.read().await.clone()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.reads_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("内存存储被设置为不可读".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn find_pending_items(&self, limit: usize) -> Result<Vec<EnrichableItem>, StoreError> {
        self.check_reads()?;
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|item| item.is_pending())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn taxonomy_snapshot(&self) -> Result<TaxonomySnapshot, StoreError> {
        self.check_reads()?;
        Ok(TaxonomySnapshot::new(self.taxonomy.read().await.clone()))
    }

    async fn update_item(&self, id: &str, patch: &EnrichmentPatch) -> Result<(), StoreError> {
        if self.failing_updates.read().await.contains(id) {
            return Err(StoreError::Unavailable(format!("拒绝更新题目 {}", id)));
        }

        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        item.apply(patch);
        Ok(())
    }

    async fn get_item(&self, id: &str) -> Result<Option<EnrichableItem>, StoreError> {
        Ok(self.items.read().await.iter().find(|item| item.id == id).cloned())
    }
}
