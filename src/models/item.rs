use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 题目的补全状态
///
/// 没有"处理中"状态：处理到一半崩溃的题目仍是 `Pending`，下次运行会被重新选中
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// 待补全的题目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichableItem {
    pub id: String,

    /// 原始文档地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// 题干文档地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_url: Option<String>,
    /// 已有的题目文本（人工整理过的文本不会被提取结果覆盖）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,

    #[serde(default)]
    pub enrichment_status: EnrichmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// 预计用时（分钟）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    /// 预计难度（1-5）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_difficulty: Option<u8>,
    #[serde(default)]
    pub theme_ids: Vec<String>,
}

impl EnrichableItem {
    /// 创建一道新的待处理题目
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_statement_url(mut self, url: impl Into<String>) -> Self {
        self.statement_url = Some(url.into());
        self
    }

    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    /// 是否已有非空文本
    pub fn has_raw_text(&self) -> bool {
        self.raw_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    pub fn is_pending(&self) -> bool {
        self.enrichment_status == EnrichmentStatus::Pending
    }

    /// 把一次更新整体应用到题目上
    pub fn apply(&mut self, patch: &EnrichmentPatch) {
        match patch {
            EnrichmentPatch::Completed(fields) => {
                if let Some(text) = &fields.raw_text {
                    self.raw_text = Some(text.clone());
                }
                self.title = fields.title.clone();
                self.summary = fields.summary.clone();
                self.keywords = fields.keywords.clone();
                self.estimated_duration = fields.estimated_duration;
                self.estimated_difficulty = fields.estimated_difficulty;
                self.theme_ids = fields.theme_ids.clone();
                self.enriched_at = Some(fields.enriched_at);
                self.enrichment_status = EnrichmentStatus::Completed;
            }
            EnrichmentPatch::Failed => {
                self.enrichment_status = EnrichmentStatus::Failed;
            }
            EnrichmentPatch::Reset => {
                self.enrichment_status = EnrichmentStatus::Pending;
            }
        }
    }
}

/// 单道题目的一次原子更新
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentPatch {
    /// 补全成功：覆盖全部补全字段
    Completed(CompletedFields),
    /// 补全失败：只修改状态，保留上一次成功的字段
    Failed,
    /// 重新提交：状态回到 pending
    Reset,
}

/// 补全成功时写入的字段
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedFields {
    /// 仅当题目原本没有文本时才写入
    pub raw_text: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub estimated_duration: Option<u32>,
    pub estimated_difficulty: Option<u8>,
    pub theme_ids: Vec<String>,
    pub enriched_at: DateTime<Utc>,
}
