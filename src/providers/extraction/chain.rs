use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{ExtractionProvider, ExtractionRequest, ExtractionResult};
use crate::error::ExtractionError;

/// 回退链：主提取器质量不足或失败时升级到备用提取器
///
/// 备用提取器失败时，主提取器已有的结果仍然有效
pub struct FallbackExtractor {
    primary: Arc<dyn ExtractionProvider>,
    secondary: Arc<dyn ExtractionProvider>,
    min_quality: f32,
    name: String,
}

impl FallbackExtractor {
    pub fn new(
        primary: Arc<dyn ExtractionProvider>,
        secondary: Arc<dyn ExtractionProvider>,
        min_quality: f32,
    ) -> Self {
        let name = format!("{}+{}", primary.name(), secondary.name());
        Self {
            primary,
            secondary,
            min_quality,
            name,
        }
    }

    fn good_enough(&self, result: &ExtractionResult) -> bool {
        !result.is_empty() && result.quality.map_or(true, |q| q >= self.min_quality)
    }
}

#[async_trait]
impl ExtractionProvider for FallbackExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError> {
        let primary = match self.primary.extract(request).await {
            Ok(result) if self.good_enough(&result) => return Ok(result),
            Ok(result) => {
                info!(
                    "题目 {} 的 {} 结果质量不足 ({:?})，转用 {}",
                    request.item_id,
                    self.primary.name(),
                    result.quality,
                    self.secondary.name()
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    "题目 {} 的 {} 失败: {}，转用 {}",
                    request.item_id,
                    self.primary.name(),
                    e,
                    self.secondary.name()
                );
                Err(e)
            }
        };

        match (self.secondary.extract(request).await, primary) {
            (Ok(result), Ok(low)) if result.is_empty() => Ok(low),
            (Ok(result), _) => Ok(result),
            (Err(e), Ok(low)) => {
                warn!("题目 {} 的 {} 失败: {}，保留低质量结果", request.item_id, self.secondary.name(), e);
                Ok(low)
            }
            (Err(e), Err(_)) => Err(e),
        }
    }
}
