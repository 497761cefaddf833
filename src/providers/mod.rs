//! 能力提供者层
//!
//! - `extraction` - 文本提取（固定结果 / PDF 文本层 / 视觉模型 OCR / 回退链）
//! - `analysis` - 内容分析（固定结果 / LLM）
//!
//! 具体实现由驱动程序在构造时选择，流程层只依赖 trait

pub mod analysis;
pub mod extraction;

pub use analysis::{
    AnalysisProvider, AnalysisRequest, AnalysisResult, FixtureAnalyzer, LlmAnalyzer,
};
pub use extraction::{
    ExtractionProvider, ExtractionRequest, ExtractionResult, FallbackExtractor, FixtureExtractor,
    PdfTextExtractor, VisionOcrExtractor,
};
