use std::time::Duration;

/// 程序配置
///
/// 由驱动程序（`main` / `App`）解析，核心流程只接收解析后的参数
#[derive(Clone, Debug)]
pub struct Config {
    /// 每次运行最多处理的题目数量
    pub batch_limit: usize,
    /// 同时处理的题目数量
    pub max_concurrent_items: usize,
    /// 是否使用固定结果的文本提取器
    pub use_fixture_extraction: bool,
    /// 是否使用固定结果的分析器
    pub use_fixture_analysis: bool,
    /// 题目与主题 TOML 文件存放目录
    pub store_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- 超时配置（秒） ---
    pub extraction_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
    pub persist_timeout_secs: u64,
    /// 提取文本少于该字符数时视为低质量，转 OCR
    pub min_text_chars: usize,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_vision_model_name: String,
    /// 首次调用失败后的重试次数
    pub llm_max_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_limit: 50,
            max_concurrent_items: 4,
            use_fixture_extraction: true,
            use_fixture_analysis: true,
            store_folder: "data".to_string(),
            verbose_logging: false,
            output_log_file: "enrichment.log".to_string(),
            extraction_timeout_secs: 120,
            analysis_timeout_secs: 90,
            persist_timeout_secs: 30,
            min_text_chars: 20,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_vision_model_name: "gpt-4o".to_string(),
            llm_max_retries: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            batch_limit: env_parse("BATCH_LIMIT").unwrap_or(default.batch_limit),
            max_concurrent_items: env_parse("MAX_CONCURRENT_ITEMS").unwrap_or(default.max_concurrent_items),
            use_fixture_extraction: env_parse("USE_FIXTURE_EXTRACTION").unwrap_or(default.use_fixture_extraction),
            use_fixture_analysis: env_parse("USE_FIXTURE_ANALYSIS").unwrap_or(default.use_fixture_analysis),
            store_folder: std::env::var("STORE_FOLDER").unwrap_or(default.store_folder),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            extraction_timeout_secs: env_parse("EXTRACTION_TIMEOUT_SECS").unwrap_or(default.extraction_timeout_secs),
            analysis_timeout_secs: env_parse("ANALYSIS_TIMEOUT_SECS").unwrap_or(default.analysis_timeout_secs),
            persist_timeout_secs: env_parse("PERSIST_TIMEOUT_SECS").unwrap_or(default.persist_timeout_secs),
            min_text_chars: env_parse("MIN_TEXT_CHARS").unwrap_or(default.min_text_chars),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_vision_model_name: std::env::var("LLM_VISION_MODEL_NAME").unwrap_or(default.llm_vision_model_name),
            llm_max_retries: env_parse("LLM_MAX_RETRIES").unwrap_or(default.llm_max_retries),
        }
    }

    /// 各阶段调用的超时
    pub fn timeouts(&self) -> EnrichmentTimeouts {
        EnrichmentTimeouts {
            extraction: Duration::from_secs(self.extraction_timeout_secs),
            analysis: Duration::from_secs(self.analysis_timeout_secs),
            persist: Duration::from_secs(self.persist_timeout_secs),
        }
    }
}

/// 单道题目流程中每个外部调用的超时上限
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnrichmentTimeouts {
    pub extraction: Duration,
    pub analysis: Duration,
    pub persist: Duration,
}

impl Default for EnrichmentTimeouts {
    fn default() -> Self {
        Config::default().timeouts()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
