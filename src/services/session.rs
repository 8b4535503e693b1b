//! 会话控制 - 业务能力层
//!
//! 管理"一个站点 + 一套凭证"的浏览器上下文完整生命周期：
//! 启动 → 配置 → 登录 → 状态追踪 → 保证释放。
//!
//! 状态机：`Uninitialized → Launching → Launched → Authenticating →
//! Authenticated → Closed`，任何非终态都可能落入 `Error`；
//! `Error` 之后唯一允许的转移是 `Closed`。进入 `Error` 或 `Closed`
//! 的控制器绝不复用，下一次尝试必须新建实例。

use chrono::{DateTime, Local};
use chromiumoxide::Browser;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::launch_browser_context;
use crate::config::Config;
use crate::error::{AdapterError, AdapterResult};
use crate::infrastructure::{resolve, PageDriver};
use crate::models::{ProxyDescriptor, SelectorStrategy, TargetDescriptor};

/// 登录页角色定位配置（每个适配器声明一份）
pub struct LoginLocators {
    pub username: Vec<SelectorStrategy>,
    pub password: Vec<SelectorStrategy>,
    pub submit: Vec<SelectorStrategy>,
    /// URL 中仍包含该片段视为仍停留在登录页
    pub login_marker: String,
    /// URL 中包含该片段视为登录被站点拒绝
    pub error_marker: String,
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Launching,
    Launched,
    Authenticating,
    Authenticated,
    Error,
    Closed,
}

/// 会话摘要（日志 / 证据输出用，不携带资源所有权）
#[derive(Debug, Clone, Serialize)]
pub struct SessionHandle {
    pub target: String,
    pub is_logged_in: bool,
    pub created_at: DateTime<Local>,
}

/// 会话控制器
///
/// 独占持有一个浏览器上下文；同一实例绝不跨并发操作共享。
pub struct SessionController {
    target: TargetDescriptor,
    config: Config,
    proxy: Option<ProxyDescriptor>,
    state: SessionState,
    browser: Option<Browser>,
    driver: Option<PageDriver>,
    handler_task: Option<JoinHandle<()>>,
    dialog_task: Option<JoinHandle<()>>,
    created_at: DateTime<Local>,
}

impl SessionController {
    pub fn new(
        target: TargetDescriptor,
        config: Config,
        proxy: Option<ProxyDescriptor>,
    ) -> Self {
        Self {
            target,
            config,
            proxy,
            state: SessionState::Uninitialized,
            browser: None,
            driver: None,
            handler_task: None,
            dialog_task: None,
            created_at: Local::now(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            target: self.target.name.clone(),
            is_logged_in: self.is_authenticated(),
            created_at: self.created_at,
        }
    }

    /// 启动浏览器上下文
    ///
    /// 只允许从 `Uninitialized` 进入；失败对本次运行是致命的，
    /// 控制器落入 `Error`，不自动重试。
    pub async fn launch(&mut self) -> AdapterResult<()> {
        if self.state != SessionState::Uninitialized {
            return Err(AdapterError::LaunchFailure {
                reason: format!("会话状态 {:?} 不允许再次启动", self.state),
            });
        }
        self.state = SessionState::Launching;

        match launch_browser_context(&self.config, self.proxy.as_ref()).await {
            Ok(ctx) => {
                self.driver = Some(PageDriver::new(
                    ctx.page,
                    self.config.operation_timeout(),
                    self.config.settle_delay(),
                ));
                self.browser = Some(ctx.browser);
                self.handler_task = Some(ctx.handler_task);
                self.dialog_task = Some(ctx.dialog_task);
                self.state = SessionState::Launched;
                debug!("[{}] 会话上下文已启动", self.target.name);
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Error;
                Err(e)
            }
        }
    }

    /// 登录目标站点
    ///
    /// 成功判定沿用"URL 不再包含登录/错误标记"的启发式：站点没有
    /// 真正的 API，这是可得的最好信号。误报为登录失败属于已知局限。
    /// 凭证被拒绝是高频、可由调用方恢复的结果，以 Err 返回而不 panic。
    pub async fn authenticate(&mut self, locators: &LoginLocators) -> AdapterResult<()> {
        if self.state != SessionState::Launched {
            return Err(AdapterError::AuthenticationFailure {
                target: self.target.name.clone(),
                reason: format!("会话状态 {:?} 不允许登录", self.state),
            });
        }
        self.state = SessionState::Authenticating;
        info!("[{}] 🔐 正在登录...", self.target.name);

        match self.do_authenticate(locators).await {
            Ok(()) => {
                self.state = SessionState::Authenticated;
                info!("[{}] ✅ 登录成功", self.target.name);
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Error;
                warn!("[{}] 登录失败: {}", self.target.name, e);
                Err(e)
            }
        }
    }

    async fn do_authenticate(&self, locators: &LoginLocators) -> AdapterResult<()> {
        let driver = self.driver_ref()?;
        driver.goto(&self.target.login_url).await?;

        // 解析用户名/密码输入框；缺失时不做任何猜测，直接报告
        let username_field = resolve(driver, "username", &locators.username)
            .await?
            .into_option()
            .ok_or_else(|| AdapterError::MissingLoginField {
                role: "username".to_string(),
            })?;
        let password_field = resolve(driver, "password", &locators.password)
            .await?
            .into_option()
            .ok_or_else(|| AdapterError::MissingLoginField {
                role: "password".to_string(),
            })?;

        driver
            .fill(&username_field, &self.target.credential.identifier)
            .await?;
        driver
            .fill(&password_field, &self.target.credential.secret)
            .await?;

        let submit = resolve(driver, "submit", &locators.submit)
            .await?
            .into_option()
            .ok_or_else(|| AdapterError::MissingLoginField {
                role: "submit".to_string(),
            })?;
        driver.click(&submit).await?;

        self.wait_for_login_outcome(driver, locators).await
    }

    /// 等待提交后的导航信号
    async fn wait_for_login_outcome(
        &self,
        driver: &PageDriver,
        locators: &LoginLocators,
    ) -> AdapterResult<()> {
        let deadline = self.config.operation_timeout();
        let poll_interval = Duration::from_millis(500);
        let mut waited = Duration::ZERO;
        let mut last_url = String::new();

        while waited < deadline {
            last_url = driver.current_url().await?;
            let on_login_page = !locators.login_marker.is_empty()
                && last_url.contains(&locators.login_marker);
            let on_error_page = !locators.error_marker.is_empty()
                && last_url.contains(&locators.error_marker);

            if on_error_page {
                return Err(AdapterError::AuthenticationFailure {
                    target: self.target.name.clone(),
                    reason: format!("站点标记登录错误 (URL: {})", last_url),
                });
            }
            if !on_login_page {
                return Ok(());
            }

            sleep(poll_interval).await;
            waited += poll_interval;
        }

        Err(AdapterError::AuthenticationFailure {
            target: self.target.name.clone(),
            reason: format!("提交后仍停留在登录页 (URL: {})", last_url),
        })
    }

    /// 获取页面驱动；未登录时立即失败，不触碰页面
    pub fn driver_for(&self, operation: &str) -> AdapterResult<&PageDriver> {
        if self.state != SessionState::Authenticated {
            return Err(AdapterError::NotAuthenticated {
                operation: operation.to_string(),
            });
        }
        self.driver_ref()
    }

    fn driver_ref(&self) -> AdapterResult<&PageDriver> {
        self.driver.as_ref().ok_or(AdapterError::LaunchFailure {
            reason: "浏览器上下文不存在".to_string(),
        })
    }

    /// 会话因致命错误失效：标记 Error 并立即释放资源
    pub async fn invalidate(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Error;
        }
        self.close().await;
    }

    /// 关闭会话，按获取的逆序释放所有资源
    ///
    /// 所有退出路径（正常完成、能力失败、上层异常折返）都必须走到
    /// 这里；重复调用是安全的空操作。
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        if let Some(task) = self.dialog_task.take() {
            task.abort();
        }
        drop(self.driver.take());
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("[{}] 关闭浏览器失败: {}", self.target.name, e);
            }
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        self.state = SessionState::Closed;
        debug!("[{}] 会话已关闭", self.target.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credential;

    fn target() -> TargetDescriptor {
        TargetDescriptor {
            name: "heaven".to_string(),
            kind: "heaven".to_string(),
            base_url: "https://heaven.example".to_string(),
            login_url: "https://heaven.example/admin/login".to_string(),
            capabilities: vec![],
            priority: 1,
            credential: Credential::new("shop001", "pw"),
        }
    }

    #[tokio::test]
    async fn capability_access_before_login_is_rejected() {
        let controller = SessionController::new(target(), Config::default(), None);
        let err = controller.driver_for("update_profile").unwrap_err();
        assert_eq!(err.kind(), "NotAuthenticated");
    }

    #[tokio::test]
    async fn close_without_launch_is_safe_and_terminal() {
        let mut controller = SessionController::new(target(), Config::default(), None);
        controller.close().await;
        assert_eq!(controller.state(), SessionState::Closed);

        // Closed 之后不允许启动
        let err = controller.launch().await.unwrap_err();
        assert_eq!(err.kind(), "LaunchFailure");
    }

    #[tokio::test]
    async fn authenticate_requires_launched_state() {
        let mut controller = SessionController::new(target(), Config::default(), None);
        let locators = LoginLocators {
            username: vec![],
            password: vec![],
            submit: vec![],
            login_marker: "/login".to_string(),
            error_marker: "error".to_string(),
        };
        let err = controller.authenticate(&locators).await.unwrap_err();
        assert_eq!(err.kind(), "AuthenticationFailure");
        assert_eq!(controller.state(), SessionState::Uninitialized);
    }

    #[test]
    fn handle_reports_login_state() {
        let controller = SessionController::new(target(), Config::default(), None);
        let handle = controller.handle();
        assert_eq!(handle.target, "heaven");
        assert!(!handle.is_logged_in);
    }
}
