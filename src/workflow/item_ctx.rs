//! 题目处理上下文
//!
//! 封装"我正在处理本批的第几道题"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 题目ID
    pub item_id: String,

    /// 题目在本批中的序号（从1开始，仅用于日志显示）
    pub item_index: usize,

    /// 本批题目总数
    pub total: usize,
}

impl ItemCtx {
    pub fn new(item_id: impl Into<String>, item_index: usize, total: usize) -> Self {
        Self {
            item_id: item_id.into(),
            item_index,
            total,
        }
    }

    /// 批次之外单独处理一道题目时使用
    pub fn standalone(item_id: impl Into<String>) -> Self {
        Self::new(item_id, 1, 1)
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[题目 {}/{} ID#{}]",
            self.item_index, self.total, self.item_id
        )
    }
}
