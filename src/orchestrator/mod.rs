//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `dispatcher` - 分发调度器
//! - 把一份载荷扇出到多个目标站点
//! - 控制并发数量（Semaphore）
//! - 隔离单站点失败，聚合完整报告
//!
//! ### `job_runner` - 任务处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 扫描任务目录，逐个执行 publish / refresh 任务
//! - 删除处理过的任务文件
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! job_runner (处理 Vec<Job>)
//!     ↓
//! dispatcher (处理一份载荷 × N 站点)
//!     ↓
//! adapters (处理单站点的一次能力调用)
//! ```

pub mod dispatcher;
pub mod job_runner;

pub use dispatcher::Dispatcher;
pub use job_runner::App;
