use std::path::Path;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, EventJavascriptDialogOpening,
    HandleJavaScriptDialogParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AdapterError, AdapterResult};
use crate::models::ProxyDescriptor;

/// 一个已启动的浏览器上下文
///
/// browser / page / 两个后台任务的所有权整体交给会话控制器，
/// 由它保证按获取的逆序释放。
pub struct BrowserContext {
    pub browser: Browser,
    pub page: Page,
    /// 浏览器事件泵
    pub handler_task: JoinHandle<()>,
    /// 对话框自动接受
    pub dialog_task: JoinHandle<()>,
}

/// 启动一个隔离的浏览器上下文
///
/// 按配置设定视口、User-Agent、语言与时区；如有代理描述则以
/// `--proxy-server` 接入指定出口。启动失败对本次运行是致命的，
/// 只报告，不自动重试。
pub async fn launch_browser_context(
    config: &Config,
    proxy: Option<&ProxyDescriptor>,
) -> AdapterResult<BrowserContext> {
    info!("🚀 启动浏览器上下文...");
    debug!("无头模式: {}, 代理: {:?}", config.headless, proxy);

    let mut args: Vec<String> = vec![
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        // 隐藏自动化特征，部分站点据此拦截登录
        "--disable-blink-features=AutomationControlled".to_string(),
        format!("--lang={}", config.locale),
    ];
    if let Some(proxy) = proxy {
        args.push(proxy.launch_arg());
    }

    let mut builder = BrowserConfig::builder()
        .viewport(Viewport {
            width: 1366,
            height: 900,
            ..Default::default()
        })
        .request_timeout(Duration::from_secs(config.operation_timeout_secs))
        .args(args);

    if config.headless {
        builder = builder.new_headless_mode();
    } else {
        builder = builder.with_head();
    }
    if let Some(exe) = &config.chrome_executable {
        builder = builder.chrome_executable(Path::new(exe));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AdapterError::LaunchFailure {
            reason: format!("配置浏览器失败: {}", e),
        }
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AdapterError::LaunchFailure {
            reason: format!("启动浏览器失败: {}", e),
        }
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AdapterError::LaunchFailure {
            reason: format!("创建页面失败: {}", e),
        }
    })?;

    configure_page(&page, config).await?;
    let dialog_task = attach_dialog_auto_accept(&page).await?;

    info!("✅ 浏览器上下文就绪");
    Ok(BrowserContext {
        browser,
        page,
        handler_task,
        dialog_task,
    })
}

/// 设定 UA / Accept-Language / 时区，并隐藏 webdriver 标记
async fn configure_page(page: &Page, config: &Config) -> AdapterResult<()> {
    let ua_params = SetUserAgentOverrideParams::builder()
        .user_agent(config.user_agent.clone())
        .accept_language(config.locale.clone())
        .build()
        .map_err(|e| AdapterError::LaunchFailure {
            reason: format!("构造 UA 覆盖失败: {}", e),
        })?;
    page.set_user_agent(ua_params).await?;

    let tz_params = SetTimezoneOverrideParams::builder()
        .timezone_id(config.timezone.clone())
        .build()
        .map_err(|e| AdapterError::LaunchFailure {
            reason: format!("构造时区覆盖失败: {}", e),
        })?;
    page.execute(tz_params).await?;

    let stealth = AddScriptToEvaluateOnNewDocumentParams::builder()
        .source("Object.defineProperty(navigator, 'webdriver', { get: () => undefined });")
        .build()
        .map_err(|e| AdapterError::LaunchFailure {
            reason: format!("构造反检测脚本失败: {}", e),
        })?;
    page.execute(stealth).await?;

    debug!("页面环境配置完成");
    Ok(())
}

/// 挂载对话框自动接受策略
///
/// 会话存续期间所有 confirm/alert 一律接受，循环绝不因无人值守的
/// 模态框而阻塞。
async fn attach_dialog_auto_accept(page: &Page) -> AdapterResult<JoinHandle<()>> {
    let mut dialogs = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| AdapterError::LaunchFailure {
            reason: format!("订阅对话框事件失败: {}", e),
        })?;

    let dialog_page = page.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = dialogs.next().await {
            debug!("自动接受对话框: {:?}", event.message);
            match HandleJavaScriptDialogParams::builder().accept(true).build() {
                Ok(params) => {
                    if let Err(e) = dialog_page.execute(params).await {
                        warn!("接受对话框失败: {}", e);
                    }
                }
                Err(e) => warn!("构造对话框应答失败: {}", e),
            }
        }
    });

    Ok(task)
}
