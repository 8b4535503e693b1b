//! 配额耗尽循环的终止性与审计记录测试
//!
//! 用内存计数器模拟站点侧的剩余次数，验证状态机的三条出口：
//! 归零 Done、上限 Aborted、连续无法解析 Aborted。

use async_trait::async_trait;

use cast_distributor::adapters::PlatformAdapter;
use cast_distributor::models::{Capability, CounterReading, QuotaRunStatus};
use cast_distributor::{AdapterError, AdapterResult, QuotaRunner};

const CAPABILITIES: &[Capability] = &[
    Capability::Login,
    Capability::ReadCounter,
    Capability::TriggerRefresh,
];

/// 计数器行为模式
enum CounterMode {
    /// 每次 trigger_refresh 递减 1
    Decrementing,
    /// 永远不变
    Stuck,
    /// 永远无法解析
    Unparsable,
}

struct FakeCounterAdapter {
    mode: CounterMode,
    remaining: u32,
    total: u32,
    login_ok: bool,
    read_calls: u32,
    refresh_calls: u32,
}

impl FakeCounterAdapter {
    fn new(mode: CounterMode, remaining: u32, total: u32) -> Self {
        Self {
            mode,
            remaining,
            total,
            login_ok: true,
            read_calls: 0,
            refresh_calls: 0,
        }
    }
}

#[async_trait]
impl PlatformAdapter for FakeCounterAdapter {
    fn name(&self) -> &str {
        "fake-heaven"
    }

    fn capabilities(&self) -> &[Capability] {
        CAPABILITIES
    }

    async fn login(&mut self) -> AdapterResult<()> {
        if self.login_ok {
            Ok(())
        } else {
            Err(AdapterError::AuthenticationFailure {
                target: "fake-heaven".to_string(),
                reason: "凭证被拒绝".to_string(),
            })
        }
    }

    async fn read_counter(&mut self) -> AdapterResult<CounterReading> {
        self.read_calls += 1;
        match self.mode {
            CounterMode::Unparsable => Ok(CounterReading::Unknown),
            _ => Ok(CounterReading::Known {
                remaining: self.remaining,
                total: self.total,
            }),
        }
    }

    async fn trigger_refresh(&mut self) -> AdapterResult<()> {
        self.refresh_calls += 1;
        if matches!(self.mode, CounterMode::Decrementing) && self.remaining > 0 {
            self.remaining -= 1;
        }
        Ok(())
    }

    async fn close(&mut self) {}
}

#[tokio::test]
async fn decrementing_counter_finishes_done_after_exactly_three_attempts() {
    let mut adapter = FakeCounterAdapter::new(CounterMode::Decrementing, 3, 10);
    let runner = QuotaRunner::new(20);

    let report = runner.run(&mut adapter).await;

    assert_eq!(report.status, QuotaRunStatus::Done);
    assert_eq!(report.attempts.len(), 3);
    assert_eq!(adapter.refresh_calls, 3);

    // 审计记录：3→2, 2→1, 1→0
    let transitions: Vec<(u32, Option<u32>)> = report
        .attempts
        .iter()
        .map(|a| (a.remaining_before, a.remaining_after))
        .collect();
    assert_eq!(
        transitions,
        vec![(3, Some(2)), (2, Some(1)), (1, Some(0))]
    );
    assert!(report.attempts.iter().all(|a| a.succeeded));
    assert_eq!(report.attempts.iter().map(|a| a.attempt).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[tokio::test]
async fn stuck_counter_aborts_exactly_at_the_attempt_ceiling() {
    let mut adapter = FakeCounterAdapter::new(CounterMode::Stuck, 5, 20);
    let runner = QuotaRunner::new(20);

    let report = runner.run(&mut adapter).await;

    match &report.status {
        QuotaRunStatus::Aborted { reason } => assert!(reason.contains("上限")),
        other => panic!("应为 Aborted，实际: {:?}", other),
    }
    // 不多不少，恰好到上限为止
    assert_eq!(report.attempts.len(), 20);
    assert_eq!(adapter.refresh_calls, 20);
    // 计数器纹丝不动，没有一次动作能确认消耗了配额
    assert!(report.attempts.iter().all(|a| !a.succeeded));
}

#[tokio::test]
async fn already_exhausted_quota_is_an_idempotent_noop() {
    let mut adapter = FakeCounterAdapter::new(CounterMode::Decrementing, 0, 10);
    let runner = QuotaRunner::new(20);

    let report = runner.run(&mut adapter).await;

    assert_eq!(report.status, QuotaRunStatus::Done);
    assert!(report.attempts.is_empty());
    assert_eq!(adapter.refresh_calls, 0);
}

#[tokio::test]
async fn two_consecutive_unparsable_reads_abort_the_run() {
    let mut adapter = FakeCounterAdapter::new(CounterMode::Unparsable, 9, 10);
    let runner = QuotaRunner::new(20);

    let report = runner.run(&mut adapter).await;

    match &report.status {
        QuotaRunStatus::Aborted { reason } => assert!(reason.contains("解析")),
        other => panic!("应为 Aborted，实际: {:?}", other),
    }
    assert!(report.attempts.is_empty());
    assert_eq!(adapter.refresh_calls, 0);
    // 恰好读了两次就放弃，不会无限轮询
    assert_eq!(adapter.read_calls, 2);
}

#[tokio::test]
async fn login_failure_aborts_before_any_counter_read() {
    let mut adapter = FakeCounterAdapter::new(CounterMode::Decrementing, 3, 10);
    adapter.login_ok = false;
    let runner = QuotaRunner::new(20);

    let report = runner.run(&mut adapter).await;

    match &report.status {
        QuotaRunStatus::Aborted { reason } => {
            assert!(reason.contains("AuthenticationFailure"))
        }
        other => panic!("应为 Aborted，实际: {:?}", other),
    }
    assert!(report.attempts.is_empty());
    assert_eq!(adapter.read_calls, 0);
    assert_eq!(adapter.refresh_calls, 0);
}
