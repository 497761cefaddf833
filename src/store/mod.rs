//! 内容存储 - 外部协作者接口
//!
//! 补全流程只通过 `ContentStore` 读写题目和主题，不关心底层存储引擎

pub mod memory;
pub mod toml_store;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{EnrichableItem, EnrichmentPatch, TaxonomySnapshot};

pub use memory::InMemoryStore;
pub use toml_store::TomlStore;

/// 内容存储
///
/// 实现必须保证 `update_item` 对单道题目是原子的
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// 按存储默认顺序返回最多 `limit` 道 pending 题目
    async fn find_pending_items(&self, limit: usize) -> Result<Vec<EnrichableItem>, StoreError>;

    /// 当前的主题表
    async fn taxonomy_snapshot(&self) -> Result<TaxonomySnapshot, StoreError>;

    /// 原子地更新一道题目
    async fn update_item(&self, id: &str, patch: &EnrichmentPatch) -> Result<(), StoreError>;

    async fn get_item(&self, id: &str) -> Result<Option<EnrichableItem>, StoreError>;

    /// 重新提交：把题目状态改回 pending，保留已有字段
    async fn reset_to_pending(&self, id: &str) -> Result<(), StoreError> {
        self.update_item(id, &EnrichmentPatch::Reset).await
    }
}
