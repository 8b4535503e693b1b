//! 适配器共享行为
//!
//! 每个站点适配器注入一份 [`AdapterCore`]，获得会话管理、角色定位、
//! 结果核验和取证能力。能力操作的结论一律以"操作后的页面状态"为准
//! （URL、成功/错误标记），绝不把"没抛错"当成功。

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AdapterError, AdapterResult};
use crate::infrastructure::{resolve, PageDriver, Resolution};
use crate::models::{ProxyDescriptor, SelectorStrategy, TargetDescriptor};
use crate::services::{EvidenceWriter, LoginLocators, SessionController};
use crate::utils::logging::truncate_text;

/// 适配器共享核心
pub struct AdapterCore {
    target: TargetDescriptor,
    config: Config,
    proxy: Option<ProxyDescriptor>,
    evidence: Arc<EvidenceWriter>,
    session: Option<SessionController>,
    last_evidence: Option<PathBuf>,
}

impl AdapterCore {
    pub fn new(
        target: TargetDescriptor,
        config: Config,
        proxy: Option<ProxyDescriptor>,
        evidence: Arc<EvidenceWriter>,
    ) -> Self {
        Self {
            target,
            config,
            proxy,
            evidence,
            session: None,
            last_evidence: None,
        }
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.is_authenticated())
            .unwrap_or(false)
    }

    pub fn last_evidence(&self) -> Option<PathBuf> {
        self.last_evidence.clone()
    }

    /// 建立会话并登录
    ///
    /// 旧会话（包括 Error/Closed 状态的）一律先销毁再重建，
    /// 出错的会话绝不复用。
    pub async fn login(&mut self, locators: &LoginLocators) -> AdapterResult<()> {
        if let Some(mut old) = self.session.take() {
            old.close().await;
        }

        let mut session = SessionController::new(
            self.target.clone(),
            self.config.clone(),
            self.proxy.clone(),
        );

        if let Err(e) = session.launch().await {
            session.close().await;
            return Err(e);
        }
        if let Err(e) = session.authenticate(locators).await {
            session.close().await;
            return Err(e);
        }

        self.session = Some(session);
        Ok(())
    }

    /// 取页面驱动；未登录立即失败，不触碰页面
    fn driver(&self, operation: &str) -> AdapterResult<&PageDriver> {
        match &self.session {
            Some(session) => session.driver_for(operation),
            None => Err(AdapterError::NotAuthenticated {
                operation: operation.to_string(),
            }),
        }
    }

    /// 导航到站点内路径；致命错误会使会话失效
    pub async fn navigate(&mut self, operation: &str, path: &str) -> AdapterResult<()> {
        let url = self.target.url_for(path);
        debug!("[{}] {} 导航到 {}", self.name(), operation, url);

        let outcome = match self.driver(operation) {
            Ok(driver) => driver.goto(&url).await,
            Err(e) => return Err(e),
        };
        self.fold_fatal(outcome).await
    }

    /// 解析一个语义角色（缺失与否由调用方定夺）
    pub async fn resolve_role(
        &self,
        operation: &str,
        role: &str,
        candidates: &[SelectorStrategy],
    ) -> AdapterResult<Resolution> {
        let driver = self.driver(operation)?;
        resolve(driver, role, candidates).await
    }

    /// 解析并填写必填角色；全部候选落空视为页面形状不符
    pub async fn fill_role(
        &mut self,
        operation: &str,
        role: &str,
        candidates: &[SelectorStrategy],
        value: &str,
    ) -> AdapterResult<()> {
        let outcome = async {
            let driver = self.driver(operation)?;
            let locator = resolve(driver, role, candidates)
                .await?
                .into_option()
                .ok_or_else(|| AdapterError::UnparsableState {
                    detail: format!("{} 页面上找不到角色 {}", operation, role),
                })?;
            driver.fill(&locator, value).await
        }
        .await;
        self.fold_fatal(outcome).await
    }

    /// 解析并填写可选角色；角色不存在时跳过，返回是否实际写入
    pub async fn fill_role_if_present(
        &mut self,
        operation: &str,
        role: &str,
        candidates: &[SelectorStrategy],
        value: &str,
    ) -> AdapterResult<bool> {
        let outcome = async {
            let driver = self.driver(operation)?;
            match resolve(driver, role, candidates).await?.into_option() {
                Some(locator) => {
                    driver.fill(&locator, value).await?;
                    Ok(true)
                }
                None => {
                    debug!("[{}] {} 缺少可选角色 {}，跳过", self.target.name, operation, role);
                    Ok(false)
                }
            }
        }
        .await;
        self.fold_fatal(outcome).await
    }

    /// 解析并点击必填角色
    pub async fn click_role(
        &mut self,
        operation: &str,
        role: &str,
        candidates: &[SelectorStrategy],
    ) -> AdapterResult<()> {
        let outcome = async {
            let driver = self.driver(operation)?;
            let locator = resolve(driver, role, candidates)
                .await?
                .into_option()
                .ok_or_else(|| AdapterError::UnparsableState {
                    detail: format!("{} 页面上找不到角色 {}", operation, role),
                })?;
            driver.click(&locator).await
        }
        .await;
        self.fold_fatal(outcome).await
    }

    /// 读取角色元素的可见文本；角色不存在返回 None
    pub async fn text_of_role(
        &self,
        operation: &str,
        role: &str,
        candidates: &[SelectorStrategy],
    ) -> AdapterResult<Option<String>> {
        let driver = self.driver(operation)?;
        let locator = match resolve(driver, role, candidates).await?.into_option() {
            Some(locator) => locator,
            None => return Ok(None),
        };
        driver.text_of(&locator).await
    }

    /// 核验操作结果：页面上必须出现成功标记
    pub async fn verify_success(&mut self, operation: &str, marker: &str) -> AdapterResult<()> {
        let outcome = async {
            let driver = self.driver(operation)?;
            let content = driver.content().await?;
            if content.contains(marker) {
                info!("[{}] ✓ {} 成功（标记: {}）", self.target.name, operation, marker);
                Ok(())
            } else {
                let url = driver.current_url().await.unwrap_or_default();
                Err(AdapterError::UnparsableState {
                    detail: format!(
                        "{} 后未见成功标记 {} (URL: {})",
                        operation,
                        marker,
                        truncate_text(&url, 120)
                    ),
                })
            }
        }
        .await;
        self.fold_fatal(outcome).await
    }

    /// 截图取证（尽力而为，失败只告警，不影响能力结果）
    pub async fn capture(&mut self, label: &str) {
        let png = match self.driver(label) {
            Ok(driver) => match driver.screenshot_png().await {
                Ok(png) => png,
                Err(e) => {
                    warn!("[{}] 截图失败 ({}): {}", self.target.name, label, e);
                    return;
                }
            },
            Err(_) => return,
        };

        let written = self
            .evidence
            .write_screenshot(&self.target.name, label, &png)
            .await;
        match written {
            Ok(path) => self.last_evidence = Some(path),
            Err(e) => warn!("[{}] 证据落盘失败 ({}): {}", self.target.name, label, e),
        }
    }

    /// 点击后等待一拍，站点前端渲染跟上之前下一步交互无效
    pub async fn settle(&self) {
        if let Ok(driver) = self.driver("settle") {
            driver.settle().await;
        }
    }

    /// 关闭会话（幂等；所有退出路径都要走到）
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }

    /// 致命错误折返：使会话失效并原样返回错误
    async fn fold_fatal<T>(&mut self, outcome: AdapterResult<T>) -> AdapterResult<T> {
        if let Err(e) = &outcome {
            if e.invalidates_session() {
                warn!("[{}] 会话因致命错误失效: {}", self.target.name, e);
                if let Some(mut session) = self.session.take() {
                    session.invalidate().await;
                }
            }
        }
        outcome
    }
}
