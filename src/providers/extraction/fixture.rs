use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ExtractionProvider, ExtractionRequest, ExtractionResult};
use crate::error::ExtractionError;

/// 固定结果的文本提取器
///
/// 对每道题目返回相同文本，可以按题目覆盖文本或注入失败
#[derive(Debug, Default)]
pub struct FixtureExtractor {
    text: String,
    per_item: HashMap<String, String>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FixtureExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_text_for(mut self, item_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.per_item.insert(item_id.into(), text.into());
        self
    }

    pub fn failing_for(mut self, item_id: impl Into<String>) -> Self {
        self.failing.insert(item_id.into());
        self
    }

    /// 已被调用的次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionProvider for FixtureExtractor {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&request.item_id) {
            return Err(ExtractionError::Fixture(format!(
                "题目 {} 的文档无法读取",
                request.item_id
            )));
        }

        let text = self
            .per_item
            .get(&request.item_id)
            .unwrap_or(&self.text)
            .clone();
        let quality = if text.trim().is_empty() { 0.0 } else { 1.0 };
        Ok(ExtractionResult::new(text, Some(quality)))
    }
}
