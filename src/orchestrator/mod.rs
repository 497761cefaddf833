//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `candidate_selector` - 候选题目选择
//! - 规整题目上限（缺省 / 0 / 超限）
//! - 只返回 pending 题目，不加锁
//!
//! ### `batch_runner` - 批量运行器
//! - 每次运行取一次主题快照
//! - 控制并发数量（Semaphore）
//! - 协作取消（CancellationToken）
//! - 汇总 attempted / succeeded / failed
//!
//! ## 层次关系
//!
//! ```text
//! batch_runner (处理 Vec<EnrichableItem>)
//!     ↓
//! workflow::EnrichmentFlow (处理单道题目)
//!     ↓
//! providers (能力层：extraction / analysis)
//!     ↓
//! infrastructure (基础设施：DocumentFetcher / LlmClient)
//! ```

pub mod batch_runner;
pub mod candidate_selector;

pub use batch_runner::{BatchRunner, RunSummary};
pub use candidate_selector::{effective_limit, CandidateSelector, MAX_BATCH_LIMIT};
