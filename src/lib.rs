//! # Exercise Enrichment
//!
//! 题目补全流水线：为原始题目提取文本、生成摘要和关键词、估计难度和时长、
//! 按主题表分类，并逐题记录成功 / 失败状态
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部客户端，只暴露能力
//! - `DocumentFetcher` - 下载题目文档
//! - `LlmClient` - OpenAI 兼容接口
//!
//! ### ② 能力层（Providers / Store）
//! - `providers/extraction` - 文本提取（fixture / pdf / vision / 回退链）
//! - `providers/analysis` - 内容分析（fixture / llm）
//! - `store/` - 内容存储（内存 / TOML 目录）
//!
//! ### ③ 流程层（Workflow）
//! - `EnrichmentFlow` - 单道题目：提取 → 分析 → 主题校验 → 原子保存
//! - `ItemCtx` - 上下文封装（题目ID + 批内序号）
//!
//! ### ④ 编排层（Orchestration）
//! - `CandidateSelector` - 选择 pending 题目
//! - `BatchRunner` - 主题快照、并发控制、取消、汇总
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::{Config, EnrichmentTimeouts};
pub use error::{AppError, AppResult, EnrichError};
pub use models::{EnrichableItem, EnrichmentPatch, EnrichmentStatus, TaxonomyEntry, TaxonomySnapshot};
pub use orchestrator::{BatchRunner, CandidateSelector, RunSummary};
pub use store::{ContentStore, InMemoryStore, TomlStore};
pub use workflow::{EnrichmentFlow, EnrichmentOutcome, ItemCtx};
