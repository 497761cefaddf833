use std::path::PathBuf;
use thiserror::Error;

/// 运行级错误
///
/// 只有批次准备阶段（选取候选题目、获取主题快照）的失败会中止整次运行，
/// 单道题目的失败在流程层内部消化
#[derive(Error, Debug)]
pub enum AppError {
    /// 选取待处理题目失败
    #[error("选取待处理题目失败: {0}")]
    Selection(#[source] StoreError),

    /// 获取主题快照失败
    #[error("获取主题快照失败: {0}")]
    Taxonomy(#[source] StoreError),
}

/// 单道题目处理失败的原因
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("文本提取失败: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("内容分析失败: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("保存结果失败: {0}")]
    Persistence(#[from] StoreError),

    /// 外部调用超时，按该阶段的普通失败处理
    #[error("{stage} 阶段超时 ({secs} 秒)")]
    Timeout { stage: Stage, secs: u64 },
}

/// 单道题目流程的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Analyze,
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Extract => "提取",
            Stage::Analyze => "分析",
            Stage::Persist => "保存",
        };
        f.write_str(name)
    }
}

/// 文本提取错误
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("下载文档失败 ({url}): {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("文档服务返回错误状态 ({url}): {status}")]
    BadStatus { url: String, status: u16 },

    #[error("无法读取文档 ({locator}): {reason}")]
    Unreadable { locator: String, reason: String },

    #[error("OCR 识别失败: {0}")]
    Vision(#[source] LlmError),

    #[error("{0}")]
    Fixture(String),
}

/// 内容分析错误
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("LLM 返回格式错误: {reason}")]
    Malformed { reason: String },

    #[error("字段 {field} 的值 {value} 超出允许范围")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("{0}")]
    Fixture(String),
}

/// LLM 服务错误
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM API 调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },

    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 内容存储错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("读写文件失败 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML解析失败 ({path}): {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("TOML序列化失败: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("题目不存在: {0}")]
    NotFound(String),

    #[error("非法的题目ID: {0}")]
    InvalidId(String),

    #[error("存储不可用: {0}")]
    Unavailable(String),
}

/// 运行级结果类型
pub type AppResult<T> = Result<T, AppError>;
