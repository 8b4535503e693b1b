//! 流程层（Workflow）
//!
//! 编排业务能力完成一类完整流程，自己不持有任何页面资源。

pub mod counter;
pub mod quota_flow;

pub use counter::parse_counter;
pub use quota_flow::QuotaRunner;
