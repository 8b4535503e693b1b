use cast_distributor::infrastructure::{PageProbe, ProbeOutcome};
use cast_distributor::utils::logging;
use cast_distributor::{launch_browser_context, Config, PageDriver};

#[tokio::test]
#[ignore] // 默认忽略，需要本机浏览器：cargo test -- --ignored
async fn smoke_launch_probe_and_close() {
    // 初始化日志
    logging::init(false);

    // 加载配置
    let config = Config::from_env();

    // 启动浏览器上下文
    let ctx = launch_browser_context(&config, None)
        .await
        .expect("启动浏览器失败");

    let driver = PageDriver::new(
        ctx.page,
        config.operation_timeout(),
        config.settle_delay(),
    );

    // 导航到公开页面并做只读探测
    driver
        .goto("https://example.com/")
        .await
        .expect("导航失败");

    let outcome = driver.probe_css("h1").await.expect("探测失败");
    assert_eq!(outcome, ProbeOutcome::Interactable, "示例页应有可见的 h1");

    let missing = driver.probe_css("#no_such_element").await.expect("探测失败");
    assert_eq!(missing, ProbeOutcome::Missing);

    // 截图能力
    let png = driver.screenshot_png().await.expect("截图失败");
    assert!(!png.is_empty());

    // 释放资源
    drop(driver);
    let mut browser = ctx.browser;
    browser.close().await.expect("关闭浏览器失败");
    ctx.handler_task.abort();
    ctx.dialog_task.abort();
}

#[tokio::test]
#[ignore]
async fn smoke_text_probe_on_live_page() {
    logging::init(false);
    let config = Config::from_env();

    let ctx = launch_browser_context(&config, None)
        .await
        .expect("启动浏览器失败");
    let driver = PageDriver::new(
        ctx.page,
        config.operation_timeout(),
        config.settle_delay(),
    );

    driver
        .goto("https://example.com/")
        .await
        .expect("导航失败");

    // 示例页有一个 "More information..." 链接
    let outcome = driver
        .probe_text("More information")
        .await
        .expect("探测失败");
    assert_eq!(outcome, ProbeOutcome::Interactable);
}
