use std::collections::HashSet;

use crate::models::TaxonomySnapshot;

/// 主题校验结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeFilter {
    /// 快照中存在的主题，去重后保持首次出现的顺序
    pub kept: Vec<String>,
    /// 快照中不存在的主题
    pub dropped: Vec<String>,
}

/// 用主题快照过滤模型建议的主题ID
///
/// 不存在的ID是预期情况（主题被删除或模型编造），直接丢弃，不算错误
pub fn filter_theme_ids(proposed: &[String], snapshot: &TaxonomySnapshot) -> ThemeFilter {
    let mut seen = HashSet::new();
    let mut filter = ThemeFilter::default();

    for id in proposed {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if snapshot.contains(id) {
            filter.kept.push(id.clone());
        } else {
            filter.dropped.push(id.clone());
        }
    }

    filter
}
