//! 分发报告与配额审计模型
//!
//! 一次分发调用产出一份 [`DistributionReport`]；一次配额刷新运行产出一份
//! [`QuotaRunReport`]。两者都只存在于单次运行期间，交给调用方后核心不再持有。

use chrono::{DateTime, Local};
use serde::Serialize;

/// 单个 (站点, 载荷) 的分发结果
#[derive(Debug, Clone, Serialize)]
pub struct DistributionResult {
    /// 站点名
    pub target: String,
    /// 是否成功
    pub succeeded: bool,
    /// 失败详情（"分类名: 描述"）
    pub error: Option<String>,
    /// 证据文件路径（截图）
    pub evidence: Option<String>,
    /// 耗时（毫秒）
    pub duration_ms: u64,
}

impl DistributionResult {
    pub fn success(target: impl Into<String>, evidence: Option<String>, duration_ms: u64) -> Self {
        Self {
            target: target.into(),
            succeeded: true,
            error: None,
            evidence,
            duration_ms,
        }
    }

    pub fn failure(
        target: impl Into<String>,
        error: impl Into<String>,
        evidence: Option<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            target: target.into(),
            succeeded: false,
            error: Some(error.into()),
            evidence,
            duration_ms,
        }
    }
}

/// 一次分发调用的聚合报告
///
/// 不变式：结果数量恒等于请求的站点数量，个别站点失败绝不缩短报告。
#[derive(Debug, Clone, Serialize)]
pub struct DistributionReport {
    /// 载荷种类
    pub payload_kind: String,
    /// 分发开始时间
    pub started_at: DateTime<Local>,
    /// 按请求顺序排列的结果
    pub results: Vec<DistributionResult>,
}

impl DistributionReport {
    /// 全部站点都成功
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.succeeded)
    }

    /// 成功数
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }
}

/// 计数器读数
///
/// 页面文本与既定模式不符时为 `Unknown`，绝不折算成 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CounterReading {
    Known { remaining: u32, total: u32 },
    Unknown,
}

impl CounterReading {
    pub fn remaining(&self) -> Option<u32> {
        match self {
            CounterReading::Known { remaining, .. } => Some(*remaining),
            CounterReading::Unknown => None,
        }
    }

    /// 配额已耗尽（Unknown 不算耗尽）
    pub fn is_exhausted(&self) -> bool {
        matches!(self, CounterReading::Known { remaining: 0, .. })
    }
}

/// 配额刷新的单次尝试记录（仅追加）
#[derive(Debug, Clone, Serialize)]
pub struct QuotaAttemptLog {
    /// 尝试序号（从 1 开始）
    pub attempt: u32,
    /// 时间戳
    pub timestamp: DateTime<Local>,
    /// 动作前剩余次数
    pub remaining_before: u32,
    /// 动作后剩余次数（重新读取失败时为 None）
    pub remaining_after: Option<u32>,
    /// 本次动作是否确认消耗了配额
    pub succeeded: bool,
}

/// 配额刷新运行的终态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuotaRunStatus {
    /// 剩余次数归零
    Done,
    /// 达到尝试上限或计数器连续无法解析
    Aborted { reason: String },
}

/// 一次配额刷新运行的完整审计记录
#[derive(Debug, Clone, Serialize)]
pub struct QuotaRunReport {
    pub target: String,
    pub status: QuotaRunStatus,
    pub attempts: Vec<QuotaAttemptLog>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_reading_exhaustion() {
        assert!(CounterReading::Known {
            remaining: 0,
            total: 10
        }
        .is_exhausted());
        assert!(!CounterReading::Known {
            remaining: 3,
            total: 10
        }
        .is_exhausted());
        assert!(!CounterReading::Unknown.is_exhausted());
        assert_eq!(CounterReading::Unknown.remaining(), None);
    }
}
