//! 文本提取能力
//!
//! 所有实现遵守同一个契约：
//! - "没有识别出文字"不是错误，返回空文本
//! - 回退链（文字层 → OCR）是实现内部的事，流程层看不到

pub mod chain;
pub mod fixture;
pub mod pdf;
pub mod vision;

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::models::EnrichableItem;

pub use chain::FallbackExtractor;
pub use fixture::FixtureExtractor;
pub use pdf::PdfTextExtractor;
pub use vision::VisionOcrExtractor;

/// 提取请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub item_id: String,
    pub primary_locator: Option<String>,
    pub secondary_locator: Option<String>,
}

impl ExtractionRequest {
    pub fn for_item(item: &EnrichableItem) -> Self {
        Self {
            item_id: item.id.clone(),
            primary_locator: item.source_url.clone(),
            secondary_locator: item.statement_url.clone(),
        }
    }

    /// 按优先级返回所有非空地址
    pub fn locators(&self) -> impl Iterator<Item = &str> {
        [&self.primary_locator, &self.secondary_locator]
            .into_iter()
            .filter_map(|loc| loc.as_deref())
            .filter(|loc| !loc.trim().is_empty())
    }
}

/// 提取结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub text: String,
    /// 质量信号（0.0-1.0），实现不提供时为 None
    pub quality: Option<f32>,
}

impl ExtractionResult {
    pub fn new(text: impl Into<String>, quality: Option<f32>) -> Self {
        Self {
            text: text.into(),
            quality,
        }
    }

    pub fn empty() -> Self {
        Self {
            text: String::new(),
            quality: Some(0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// 文本提取提供者
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// 用于日志的名称
    fn name(&self) -> &str;

    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError>;
}
