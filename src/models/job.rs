//! 任务文件模型
//!
//! 任务目录下每个 TOML 文件描述一个待执行的工作单元，处理完成后删除。

use crate::models::payload::ContentPayload;
use serde::Deserialize;

/// 一个工作单元
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionJob {
    /// 向多个站点分发一份内容
    Publish {
        targets: Vec<String>,
        payload: ContentPayload,
    },
    /// 对指定站点执行配额刷新循环
    Refresh { targets: Vec<String> },
}

impl DistributionJob {
    /// 任务种类名（用于日志）
    pub fn kind_name(&self) -> &'static str {
        match self {
            DistributionJob::Publish { .. } => "publish",
            DistributionJob::Refresh { .. } => "refresh",
        }
    }

    pub fn target_count(&self) -> usize {
        match self {
            DistributionJob::Publish { targets, .. } => targets.len(),
            DistributionJob::Refresh { targets } => targets.len(),
        }
    }
}
