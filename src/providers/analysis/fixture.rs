use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{AnalysisProvider, AnalysisRequest, AnalysisResult};
use crate::error::AnalysisError;

/// 固定结果的分析器
///
/// 非空文本返回预设结果，空文本返回降级结果
#[derive(Debug, Default)]
pub struct FixtureAnalyzer {
    result: AnalysisResult,
    per_item: HashMap<String, AnalysisResult>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FixtureAnalyzer {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            result,
            ..Default::default()
        }
    }

    pub fn with_result_for(mut self, item_id: impl Into<String>, result: AnalysisResult) -> Self {
        self.per_item.insert(item_id.into(), result);
        self
    }

    pub fn failing_for(mut self, item_id: impl Into<String>) -> Self {
        self.failing.insert(item_id.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProvider for FixtureAnalyzer {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(request.item_id) {
            return Err(AnalysisError::Fixture(format!(
                "题目 {} 的分析被设置为失败",
                request.item_id
            )));
        }

        if request.text.trim().is_empty() {
            return Ok(AnalysisResult::degraded());
        }

        Ok(self
            .per_item
            .get(request.item_id)
            .unwrap_or(&self.result)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_text_degrades() {
        let analyzer = FixtureAnalyzer::new(AnalysisResult {
            title: Some("Équation".to_string()),
            estimated_difficulty: Some(3),
            ..Default::default()
        });
        let request = AnalysisRequest {
            item_id: "ex-1",
            text: "  ",
            available_labels: &[],
        };

        let result = analyzer.analyze(&request).await.unwrap();
        assert_eq!(result, AnalysisResult::degraded());
        assert_eq!(analyzer.calls(), 1);
    }
}
