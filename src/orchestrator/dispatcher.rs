//! 分发调度器 - 编排层
//!
//! ## 职责
//!
//! 把一份内容载荷扇出到多个目标站点，并把各站点的独立结果聚合成
//! 一份完整报告。
//!
//! ## 核心规则
//!
//! 1. **并发控制**：Semaphore 限制同时活跃的站点会话数量
//! 2. **失败隔离**：单个站点的异常被捕获折算成失败结果，绝不取消
//!    或拖延其他站点
//! 3. **保证关闭**：每个站点的适配器在任何结局下都会关闭
//! 4. **完整报告**：请求了 N 个站点就返回 N 条结果，包括找不到
//!    适配器（AdapterNotFound）和载荷不被支持（Unsupported）的站点
//! 5. **截止时间**：到达分发级截止时间后，在途站点记为超时失败，
//!    已完成的结果照常返回

use chrono::Local;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::adapters::{AdapterRegistry, PlatformAdapter};
use crate::config::Config;
use crate::error::{AdapterError, AdapterResult};
use crate::models::{ContentPayload, DistributionReport, DistributionResult};

/// 分发调度器
pub struct Dispatcher {
    registry: Arc<AdapterRegistry>,
    max_concurrent_targets: usize,
    deadline: Duration,
}

/// 每个请求站点占一个槽位，无论走不走会话
enum Slot {
    Ready(DistributionResult),
    Task(String, JoinHandle<DistributionResult>),
}

impl Dispatcher {
    pub fn new(registry: Arc<AdapterRegistry>, config: &Config) -> Self {
        Self {
            registry,
            max_concurrent_targets: config.max_concurrent_targets,
            deadline: config.dispatch_deadline(),
        }
    }

    /// 向指定站点分发一份载荷
    ///
    /// 返回的报告恒有"每个请求站点一条结果"，个别失败不缩短报告。
    pub async fn dispatch(
        &self,
        payload: &ContentPayload,
        target_names: &[String],
    ) -> DistributionReport {
        let started_at = Local::now();
        info!(
            "📤 分发 {} 到 {} 个站点",
            payload.kind_name(),
            target_names.len()
        );

        // 必填字段校验不过关就不碰任何站点
        if let Err(reason) = payload.validate() {
            warn!("载荷校验失败: {}", reason);
            let results = target_names
                .iter()
                .map(|name| {
                    DistributionResult::failure(
                        name.clone(),
                        format!("PayloadInvalid: {}", reason),
                        None,
                        0,
                    )
                })
                .collect();
            return DistributionReport {
                payload_kind: payload.kind_name().to_string(),
                started_at,
                results,
            };
        }

        let deadline_at = Instant::now() + self.deadline;
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_targets));
        let mut slots = Vec::with_capacity(target_names.len());

        for name in target_names {
            let adapter = match self.registry.create(name) {
                Some(adapter) => adapter,
                None => {
                    warn!("[{}] 未注册适配器", name);
                    let err = AdapterError::AdapterNotFound {
                        target: name.clone(),
                    };
                    slots.push(Slot::Ready(DistributionResult::failure(
                        name.clone(),
                        err.report_detail(),
                        None,
                        0,
                    )));
                    continue;
                }
            };

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("[{}] 并发许可获取失败: {}", name, e);
                    slots.push(Slot::Ready(DistributionResult::failure(
                        name.clone(),
                        format!("TaskFailure: 并发许可获取失败: {}", e),
                        None,
                        0,
                    )));
                    continue;
                }
            };

            let payload = payload.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                run_target(adapter, payload, deadline_at).await
            });
            slots.push(Slot::Task(name.clone(), handle));
        }

        let mut results = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Slot::Ready(result) => results.push(result),
                Slot::Task(name, handle) => match handle.await {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        error!("[{}] 分发任务执行失败: {}", name, e);
                        results.push(DistributionResult::failure(
                            name,
                            format!("TaskFailure: 任务执行失败: {}", e),
                            None,
                            0,
                        ));
                    }
                },
            }
        }

        let report = DistributionReport {
            payload_kind: payload.kind_name().to_string(),
            started_at,
            results,
        };
        info!(
            "📥 分发完成: 成功 {}/{}",
            report.success_count(),
            report.results.len()
        );
        report
    }
}

/// 处理单个站点：登录 → 执行能力 → 保证关闭
async fn run_target(
    mut adapter: Box<dyn PlatformAdapter>,
    payload: ContentPayload,
    deadline_at: Instant,
) -> DistributionResult {
    let name = adapter.name().to_string();
    let started = Instant::now();

    let required = payload.required_capability();
    let outcome: AdapterResult<()> = if !adapter.supports(required) {
        Err(AdapterError::Unsupported {
            target: name.clone(),
            capability: required.as_str().to_string(),
        })
    } else {
        let remaining = deadline_at.saturating_duration_since(Instant::now());
        match timeout(remaining, login_and_apply(adapter.as_mut(), &payload)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AdapterError::Timeout {
                operation: format!("dispatch {}", payload.kind_name()),
                timeout_secs: remaining.as_secs(),
            }),
        }
    };

    // 任何结局都要关闭适配器释放会话
    adapter.close().await;

    let evidence = adapter.last_evidence().map(|p| p.display().to_string());
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(()) => {
            info!("[{}] ✅ 分发成功 ({} ms)", name, duration_ms);
            DistributionResult::success(name, evidence, duration_ms)
        }
        Err(e) => {
            error!("[{}] ❌ 分发失败: {}", name, e);
            DistributionResult::failure(name, e.report_detail(), evidence, duration_ms)
        }
    }
}

async fn login_and_apply(
    adapter: &mut dyn PlatformAdapter,
    payload: &ContentPayload,
) -> AdapterResult<()> {
    adapter.login().await?;
    match payload {
        ContentPayload::ProfileUpdate(data) => adapter.update_profile(data).await,
        ContentPayload::ScheduleUpdate(data) => adapter.update_schedule(data).await,
        ContentPayload::DiaryPost(data) => adapter.post_diary(data).await,
    }
}
