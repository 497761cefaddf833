/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::fmt::{self, format};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::orchestrator::RunSummary;

/// 写入日志文件的格式化层（无 ANSI 颜色）
pub type FileLayer<S> = fmt::Layer<S, format::DefaultFields, format::Format, Mutex<File>>;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 给出 `log_file_path` 时同一份日志也追加写入该文件
pub fn init(verbose: bool, log_file_path: Option<&str>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let file = log_file_path.map(file_layer).transpose()?;

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file)
        .try_init();
    Ok(())
}

/// 以追加模式打开日志文件，返回对应的格式化层
pub fn file_layer<S>(log_file_path: &str) -> Result<FileLayer<S>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;

    Ok(fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false))
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目补全日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `limit`: 本次运行的题目上限
/// - `max_concurrent`: 最大并发数
/// - `extractor` / `analyzer`: 绑定的提供者名称
pub fn log_startup(limit: usize, max_concurrent: usize, extractor: &str, analyzer: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目补全模式");
    info!("📊 本次上限: {} 道, 最大并发数: {}", limit, max_concurrent);
    info!("🔧 文本提取: {}, 内容分析: {}", extractor, analyzer);
    info!("{}", "=".repeat(60));
}

/// 记录候选题目加载信息
pub fn log_candidates_loaded(total: usize, themes: usize) {
    info!("✓ 找到 {} 道待补全的题目", total);
    info!("📚 主题快照: {} 个主题", themes);
}

/// 记录没有候选题目
pub fn log_no_candidates() {
    warn!("⚠️ 没有待补全的题目，本次运行结束");
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 运行汇总
/// - `cancelled`: 是否被取消
pub fn print_final_stats(summary: &RunSummary, cancelled: bool) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📝 尝试: {}", summary.attempted);
    info!("✅ 成功: {}/{}", summary.succeeded, summary.attempted);
    info!("❌ 失败: {}", summary.failed);
    if cancelled {
        warn!("⏹️ 运行被取消，未开始的题目保持 pending");
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
