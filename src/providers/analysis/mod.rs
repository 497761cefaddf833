//! 内容分析能力
//!
//! 所有实现遵守同一个契约：
//! - 空文本也要返回合法结果（空关键词、无时长/难度、无主题）
//! - 难度在 1-5 之间，时长为非负分钟数

pub mod fixture;
pub mod llm;

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::models::TaxonomyEntry;

pub use fixture::FixtureAnalyzer;
pub use llm::LlmAnalyzer;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

/// 分析请求
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub item_id: &'a str,
    pub text: &'a str,
    /// 当前可选的主题
    pub available_labels: &'a [TaxonomyEntry],
}

/// 分析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub estimated_duration: Option<u32>,
    pub estimated_difficulty: Option<u8>,
    /// 模型建议的主题ID，可能包含已不存在的主题
    pub theme_ids: Vec<String>,
}

impl AnalysisResult {
    /// 文本为空时的降级结果
    pub fn degraded() -> Self {
        Self::default()
    }

    /// 检查结果是否满足契约
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if let Some(difficulty) = self.estimated_difficulty {
            if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
                return Err(AnalysisError::OutOfRange {
                    field: "estimated_difficulty",
                    value: i64::from(difficulty),
                });
            }
        }
        Ok(())
    }
}

/// 内容分析提供者
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, AnalysisError>;
}
