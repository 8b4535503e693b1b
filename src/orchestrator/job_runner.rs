//! 任务处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责任务目录的批量处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、载入站点清单、构建适配器注册表
//! 2. **批量加载**：扫描并加载所有待处理的任务文件
//! 3. **逐个执行**：publish 任务交给分发调度器，refresh 任务交给
//!    配额耗尽循环
//! 4. **文件清理**：处理过的任务文件即刻删除（每次调用至多尝试一次，
//!    重试需要重新投放任务文件）
//! 5. **全局统计**：汇总所有任务的处理结果

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::adapters::{build_registry, AdapterRegistry};
use crate::config::Config;
use crate::models::loaders::{load_all_jobs, load_site_config, SiteConfig};
use crate::models::{ContentPayload, DistributionJob, QuotaRunStatus};
use crate::orchestrator::dispatcher::Dispatcher;
use crate::services::{EvidenceWriter, ProxySelector};
use crate::utils::logging::{
    init_log_file, log_job_complete, log_job_start, log_jobs_loaded, log_startup,
    print_final_stats,
};
use crate::workflow::QuotaRunner;

/// 应用主结构
pub struct App {
    config: Config,
    sites: SiteConfig,
    registry: Arc<AdapterRegistry>,
    dispatcher: Dispatcher,
    evidence: Arc<EvidenceWriter>,
}

/// 任务处理统计
#[derive(Debug, Default)]
struct JobStats {
    success: usize,
    failed: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        let sites = load_site_config(Path::new(&config.site_config_file)).await?;

        let evidence = Arc::new(EvidenceWriter::new(&config.evidence_folder));
        evidence.ensure_folder().await?;

        let proxies = Arc::new(ProxySelector::from_entries(&sites.proxies));
        let registry = Arc::new(build_registry(&sites, &config, proxies, evidence.clone()));

        log_startup(config.max_concurrent_targets, registry.len());

        let dispatcher = Dispatcher::new(registry.clone(), &config);

        Ok(Self {
            config,
            sites,
            registry,
            dispatcher,
            evidence,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        info!("\n📁 正在扫描待处理的任务...");
        let jobs = load_all_jobs(&self.config.jobs_folder).await?;

        if jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的任务文件，程序结束");
            return Ok(());
        }

        let total = jobs.len();
        log_jobs_loaded(total);

        let mut stats = JobStats::default();

        for (idx, (path, job)) in jobs.iter().enumerate() {
            let job_num = idx + 1;
            log_job_start(job_num, total, job.kind_name(), job.target_count());

            let succeeded = match job {
                DistributionJob::Publish { targets, payload } => {
                    self.run_publish(payload, targets).await
                }
                DistributionJob::Refresh { targets } => self.run_refresh(targets).await,
            };

            // 处理过即删除：本系统只保证每次投放至多尝试一次
            cleanup_job_file(path)?;

            if succeeded {
                stats.success += 1;
            } else {
                stats.failed += 1;
            }
            log_job_complete(job_num, stats.success, total);
        }

        print_final_stats(
            stats.success,
            stats.failed,
            total,
            &self.config.output_log_file,
        );
        Ok(())
    }

    /// 执行一个 publish 任务，返回是否全站成功
    async fn run_publish(&self, payload: &ContentPayload, targets: &[String]) -> bool {
        let report = self.dispatcher.dispatch(payload, targets).await;

        for result in &report.results {
            if result.succeeded {
                info!("  ✓ {} ({} ms)", result.target, result.duration_ms);
            } else {
                warn!(
                    "  ✗ {} : {}",
                    result.target,
                    result.error.as_deref().unwrap_or("未知错误")
                );
            }
        }

        if let Err(e) = self
            .evidence
            .write_json(&report.payload_kind, "report", &report)
            .await
        {
            error!("分发报告落盘失败: {}", e);
        }

        report.all_succeeded()
    }

    /// 执行一个 refresh 任务，返回是否全部站点跑到 Done
    async fn run_refresh(&self, targets: &[String]) -> bool {
        let runner = QuotaRunner::new(self.config.max_refresh_attempts);
        let mut all_done = true;

        // 按站点优先级依次执行
        for name in self.order_by_priority(targets) {
            let mut adapter = match self.registry.create(&name) {
                Some(adapter) => adapter,
                None => {
                    warn!("[{}] 未注册适配器，跳过刷新", name);
                    all_done = false;
                    continue;
                }
            };

            let report = runner.run(adapter.as_mut()).await;
            adapter.close().await;

            if let Err(e) = self.evidence.write_json(&name, "quota_run", &report).await {
                error!("[{}] 配额审计落盘失败: {}", name, e);
            }

            if !matches!(report.status, QuotaRunStatus::Done) {
                all_done = false;
            }
        }

        all_done
    }

    /// 按清单中的优先级排序（数字小的先跑），未知站点保持原位殿后
    fn order_by_priority(&self, targets: &[String]) -> Vec<String> {
        let mut ordered: Vec<String> = targets.to_vec();
        ordered.sort_by_key(|name| {
            self.sites
                .targets
                .iter()
                .find(|t| &t.name == name)
                .map(|t| t.priority)
                .unwrap_or(u8::MAX)
        });
        ordered
    }
}

/// 清理已处理的任务文件
fn cleanup_job_file(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("无法删除任务文件: {}", path.display()))?;
        info!(
            "🗑️ 任务文件已删除: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
    } else {
        warn!("⚠️ 任务文件不存在: {}", path.display());
    }
    Ok(())
}
