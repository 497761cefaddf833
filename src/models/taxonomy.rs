use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 主题（分类标签）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub id: String,
    /// 简短名称，供分析模型选择标签时参考
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaxonomyEntry {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
        }
    }
}

/// 一次运行开始时获取的主题快照
///
/// 管理员可能在运行期间删除主题，快照在整次运行内只读共享，
/// 保存前用它校验分析结果中的主题ID
#[derive(Debug, Clone, Default)]
pub struct TaxonomySnapshot {
    entries: Vec<TaxonomyEntry>,
    ids: HashSet<String>,
}

impl TaxonomySnapshot {
    pub fn new(entries: Vec<TaxonomyEntry>) -> Self {
        let ids = entries.iter().map(|e| e.id.clone()).collect();
        Self { entries, ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
