//! 站点适配层（Adapters）
//!
//! 多态单元：每个适配器针对一个目标站点的标记习惯实现同一套能力接口。
//! 共享行为通过注入的 [`core::AdapterCore`] 组合获得，不做继承层级。

pub mod core;
pub mod deli_town;
pub mod heaven;
pub mod night_navi;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::error::{AdapterError, AdapterResult};
use crate::models::loaders::SiteConfig;
use crate::models::{
    Capability, CounterReading, DiaryPost, ProfileUpdate, ScheduleUpdate,
};
use crate::services::{EvidenceWriter, ProxySelector};

pub use self::core::AdapterCore;
pub use self::deli_town::DeliTownAdapter;
pub use self::heaven::HeavenAdapter;
pub use self::night_navi::NightNaviAdapter;

fn unsupported(target: &str, capability: Capability) -> AdapterError {
    AdapterError::Unsupported {
        target: target.to_string(),
        capability: capability.as_str().to_string(),
    }
}

/// 站点适配器能力接口
///
/// 并非每个适配器都实现全部能力：默认实现返回带标记的 `Unsupported`，
/// 绝不静默成功。调用方应先查询 `capabilities()` 再调用。
/// 任何能力在成功 `login` 之前调用都立即返回 `NotAuthenticated`，
/// 不触碰页面。
#[async_trait]
pub trait PlatformAdapter: Send {
    /// 站点名
    fn name(&self) -> &str;

    /// 本适配器实现的能力集
    fn capabilities(&self) -> &[Capability];

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// 建立会话并登录
    async fn login(&mut self) -> AdapterResult<()>;

    async fn update_profile(&mut self, _data: &ProfileUpdate) -> AdapterResult<()> {
        Err(unsupported(self.name(), Capability::UpdateProfile))
    }

    async fn update_schedule(&mut self, _data: &ScheduleUpdate) -> AdapterResult<()> {
        Err(unsupported(self.name(), Capability::UpdateSchedule))
    }

    async fn post_diary(&mut self, _data: &DiaryPost) -> AdapterResult<()> {
        Err(unsupported(self.name(), Capability::PostDiary))
    }

    async fn read_counter(&mut self) -> AdapterResult<CounterReading> {
        Err(unsupported(self.name(), Capability::ReadCounter))
    }

    async fn trigger_refresh(&mut self) -> AdapterResult<()> {
        Err(unsupported(self.name(), Capability::TriggerRefresh))
    }

    /// 最近一次能力操作留下的证据文件
    fn last_evidence(&self) -> Option<PathBuf> {
        None
    }

    /// 释放会话资源（幂等）
    async fn close(&mut self);
}

/// 适配器工厂：每次分发为目标站点新建一个独立实例
pub type AdapterFactory = Box<dyn Fn() -> Box<dyn PlatformAdapter> + Send + Sync>;

/// 已启用适配器的注册表
#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: AdapterFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// 为指定站点创建一个新适配器实例
    pub fn create(&self, name: &str) -> Option<Box<dyn PlatformAdapter>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// 按站点清单构建注册表
///
/// 每个工厂在创建适配器时向代理选择器轮询取一个出口；
/// 未知的适配器类型告警跳过，不影响其余站点。
pub fn build_registry(
    sites: &SiteConfig,
    config: &Config,
    proxies: Arc<ProxySelector>,
    evidence: Arc<EvidenceWriter>,
) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();

    for target in &sites.targets {
        let name = target.name.clone();
        let target = target.clone();
        let config = config.clone();
        let proxies = proxies.clone();
        let evidence = evidence.clone();

        let kind = target.kind.clone();
        let factory: AdapterFactory = match kind.as_str() {
            "heaven" => Box::new(move || {
                let core = AdapterCore::new(
                    target.clone(),
                    config.clone(),
                    proxies.next(),
                    evidence.clone(),
                );
                Box::new(HeavenAdapter::new(core))
            }),
            "deli_town" => Box::new(move || {
                let core = AdapterCore::new(
                    target.clone(),
                    config.clone(),
                    proxies.next(),
                    evidence.clone(),
                );
                Box::new(DeliTownAdapter::new(core))
            }),
            "night_navi" => Box::new(move || {
                let core = AdapterCore::new(
                    target.clone(),
                    config.clone(),
                    proxies.next(),
                    evidence.clone(),
                );
                Box::new(NightNaviAdapter::new(core))
            }),
            other => {
                warn!("站点 {} 的适配器类型未知: {}，已跳过", name, other);
                continue;
            }
        };

        registry.register(name, factory);
    }

    registry
}
