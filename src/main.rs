use anyhow::Result;
use exercise_enrichment::utils::logging;
use exercise_enrichment::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init_log_file(&config.output_log_file)?;
    logging::init(config.verbose_logging, Some(&config.output_log_file))?;

    // 初始化并运行应用
    let summary = App::initialize(config)?.run().await?;
    if summary.failed > 0 {
        tracing::warn!("⚠️ {} 道题目补全失败，可稍后重新提交", summary.failed);
    }

    Ok(())
}
