//! 配额耗尽循环 - 流程层
//!
//! 核心职责：驱动单个适配器的 read_counter / trigger_refresh 能力，
//! 直到站点侧的剩余次数归零。
//!
//! 状态机：`Idle → Authenticating → Polling → Acting → Polling → …
//! → Done | Aborted`。两条强制终止规则保证循环永不失控：
//! 尝试次数上限（即使计数器因改版永远不归零也会停），以及
//! 连续两次读数无法解析立即放弃（视为站点改版，需要人工介入）。

use chrono::Local;
use tracing::{info, warn};

use crate::adapters::PlatformAdapter;
use crate::models::{CounterReading, QuotaAttemptLog, QuotaRunReport, QuotaRunStatus};

/// 配额耗尽循环
pub struct QuotaRunner {
    max_attempts: u32,
}

impl QuotaRunner {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// 对一个适配器执行完整的配额耗尽运行
    ///
    /// 登录失败直接以 `Aborted` 结束（不重试）；配额本来就是 0 时
    /// 立即 `Done`，重复运行是无害的空操作。每次动作都追加一条
    /// 审计记录。适配器的关闭由调用方负责。
    pub async fn run(&self, adapter: &mut dyn PlatformAdapter) -> QuotaRunReport {
        let target = adapter.name().to_string();
        let started_at = Local::now();
        let mut attempts: Vec<QuotaAttemptLog> = Vec::new();

        info!("[{}] ♻️ 配额耗尽循环开始", target);

        // ========== Authenticating ==========
        if let Err(e) = adapter.login().await {
            warn!("[{}] 配额循环登录失败，放弃本次运行: {}", target, e);
            return QuotaRunReport {
                target,
                status: QuotaRunStatus::Aborted {
                    reason: format!("登录失败: {}", e.report_detail()),
                },
                attempts,
                started_at,
                finished_at: Local::now(),
            };
        }

        // ========== Polling / Acting ==========
        let mut unparsable_streak: u32 = 0;
        let mut reading = match adapter.read_counter().await {
            Ok(reading) => reading,
            Err(e) => {
                return self.aborted_report(
                    target,
                    attempts,
                    started_at,
                    format!("读取计数器失败: {}", e.report_detail()),
                );
            }
        };

        let status = loop {
            match reading {
                CounterReading::Known { remaining: 0, total } => {
                    info!("[{}] 剩余 0/{}，配额已耗尽", target, total);
                    break QuotaRunStatus::Done;
                }

                CounterReading::Unknown => {
                    unparsable_streak += 1;
                    warn!(
                        "[{}] 计数器无法解析（连续 {} 次）",
                        target, unparsable_streak
                    );
                    if unparsable_streak >= 2 {
                        break QuotaRunStatus::Aborted {
                            reason: "计数器连续两次无法解析，疑似站点改版".to_string(),
                        };
                    }
                    // 重新读一次再下结论
                    reading = match adapter.read_counter().await {
                        Ok(reading) => reading,
                        Err(e) => {
                            break QuotaRunStatus::Aborted {
                                reason: format!("读取计数器失败: {}", e.report_detail()),
                            };
                        }
                    };
                }

                CounterReading::Known { remaining, total } => {
                    unparsable_streak = 0;

                    if attempts.len() as u32 >= self.max_attempts {
                        break QuotaRunStatus::Aborted {
                            reason: format!("达到尝试上限 {} 次", self.max_attempts),
                        };
                    }

                    let attempt_no = attempts.len() as u32 + 1;
                    info!(
                        "[{}] 第 {} 次刷新（剩余 {}/{}）",
                        target, attempt_no, remaining, total
                    );

                    let refresh_ok = match adapter.trigger_refresh().await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!("[{}] 触发刷新失败: {}", target, e);
                            false
                        }
                    };

                    // 动作后强制重新读取，页面内的值可能是陈旧缓存
                    let after = match adapter.read_counter().await {
                        Ok(after) => after,
                        Err(e) => {
                            warn!("[{}] 动作后读取计数器失败: {}", target, e);
                            CounterReading::Unknown
                        }
                    };

                    let remaining_after = after.remaining();
                    let consumed = remaining_after.map(|r| r < remaining).unwrap_or(false);
                    attempts.push(QuotaAttemptLog {
                        attempt: attempt_no,
                        timestamp: Local::now(),
                        remaining_before: remaining,
                        remaining_after,
                        succeeded: refresh_ok && consumed,
                    });

                    reading = after;
                }
            }
        };

        let finished_at = Local::now();
        match &status {
            QuotaRunStatus::Done => {
                info!(
                    "[{}] ✅ 配额耗尽循环完成，共 {} 次尝试",
                    target,
                    attempts.len()
                );
            }
            QuotaRunStatus::Aborted { reason } => {
                warn!("[{}] ⚠️ 配额耗尽循环中止: {}", target, reason);
            }
        }

        QuotaRunReport {
            target,
            status,
            attempts,
            started_at,
            finished_at,
        }
    }

    fn aborted_report(
        &self,
        target: String,
        attempts: Vec<QuotaAttemptLog>,
        started_at: chrono::DateTime<Local>,
        reason: String,
    ) -> QuotaRunReport {
        warn!("[{}] ⚠️ 配额耗尽循环中止: {}", target, reason);
        QuotaRunReport {
            target,
            status: QuotaRunStatus::Aborted { reason },
            attempts,
            started_at,
            finished_at: Local::now(),
        }
    }
}
