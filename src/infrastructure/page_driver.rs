//! 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，向上只暴露"导航 / 探测 / 交互 / 取证"能力，
//! 不认识任何站点或载荷。所有导航等待都带超时上限，超时以
//! [`AdapterError::Timeout`] 上浮，绝不无限挂起。

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::error::{AdapterError, AdapterResult};
use crate::infrastructure::locator::{PageProbe, ProbeOutcome, ResolvedLocator};

/// 文本匹配交互时扫描的元素集合
const CLICKABLE_SCAN: &str = r#"a, button, input[type="submit"], input[type="button"]"#;

#[derive(Debug, Deserialize)]
struct ProbeReply {
    found: bool,
    interactable: bool,
}

/// 页面驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露带超时的导航与交互能力
/// - 不认识 TargetDescriptor / ContentPayload
/// - 不处理业务流程
#[derive(Debug)]
pub struct PageDriver {
    page: Page,
    op_timeout: Duration,
    settle_delay: Duration,
}

impl PageDriver {
    pub fn new(page: Page, op_timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            page,
            op_timeout,
            settle_delay,
        }
    }

    /// 获取 page 的引用（用于会话级操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AdapterResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result
            .into_value()
            .map_err(chromiumoxide::error::CdpError::from)?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> AdapterResult<T> {
        let result = self.page.evaluate(js_code.into()).await?;
        let typed_value = result
            .into_value()
            .map_err(chromiumoxide::error::CdpError::from)?;
        Ok(typed_value)
    }

    /// 导航到 URL 并等待加载完成（带超时 + 稳定等待）
    pub async fn goto(&self, url: &str) -> AdapterResult<()> {
        debug!("导航到: {}", url);
        let nav = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match timeout(self.op_timeout, nav).await {
            Ok(Ok(())) => {
                self.settle().await;
                Ok(())
            }
            Ok(Err(e)) => Err(AdapterError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(AdapterError::Timeout {
                operation: format!("goto {}", url),
                timeout_secs: self.op_timeout.as_secs(),
            }),
        }
    }

    /// 强制重新加载当前页面（计数器读取前用，避免读到陈旧值）
    pub async fn reload(&self) -> AdapterResult<()> {
        let url = self.current_url().await?;
        self.goto(&url).await
    }

    /// 当前页面 URL
    pub async fn current_url(&self) -> AdapterResult<String> {
        let url = self.page.url().await?;
        Ok(url.unwrap_or_default())
    }

    /// 当前页面 HTML
    pub async fn content(&self) -> AdapterResult<String> {
        Ok(self.page.content().await?)
    }

    /// UI 操作后的稳定等待（站点的客户端渲染需要喘息时间）
    pub async fn settle(&self) {
        sleep(self.settle_delay).await;
    }

    /// 点击已解析的元素
    pub async fn click(&self, locator: &ResolvedLocator) -> AdapterResult<()> {
        match locator {
            ResolvedLocator::Css(selector) => {
                let element = self.page.find_element(selector.as_str()).await?;
                element.click().await?;
            }
            ResolvedLocator::Text(needle) => {
                let js_code = format!(
                    r#"
                    (() => {{
                        const needle = {needle};
                        const nodes = document.querySelectorAll('{scan}');
                        for (const el of nodes) {{
                            const text = (el.innerText || el.value || '').trim();
                            if (text.includes(needle)) {{ el.click(); return true; }}
                        }}
                        return false;
                    }})()
                    "#,
                    needle = js_string(needle),
                    scan = CLICKABLE_SCAN,
                );
                let clicked: bool = self.eval_as(js_code).await?;
                if !clicked {
                    return Err(AdapterError::UnparsableState {
                        detail: format!("找不到文本为 {} 的可点击元素", needle),
                    });
                }
            }
        }
        self.settle().await;
        Ok(())
    }

    /// 向已解析的输入元素写入值
    ///
    /// 赋值后派发 input/change 事件，站点的前端脚本才会感知变更。
    pub async fn fill(&self, locator: &ResolvedLocator, value: &str) -> AdapterResult<()> {
        let selector = match locator {
            ResolvedLocator::Css(selector) => selector,
            ResolvedLocator::Text(needle) => {
                return Err(AdapterError::UnparsableState {
                    detail: format!("文本定位 {} 不能用于输入框", needle),
                });
            }
        };

        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) {{ return false; }}
                el.focus();
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            sel = js_string(selector),
            value = js_string(value),
        );

        let filled: bool = self.eval_as(js_code).await?;
        if !filled {
            return Err(AdapterError::UnparsableState {
                detail: format!("输入框 {} 已消失", selector),
            });
        }
        Ok(())
    }

    /// 读取已解析元素的可见文本
    pub async fn text_of(&self, locator: &ResolvedLocator) -> AdapterResult<Option<String>> {
        let selector = match locator {
            ResolvedLocator::Css(selector) => selector,
            ResolvedLocator::Text(_) => return Ok(None),
        };

        // 元素缺失或无文本时返回空串哨兵，避免 JS null 穿过反序列化
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                return el ? (el.innerText || '') : '';
            }})()
            "#,
            sel = js_string(selector),
        );

        let text: String = self.eval_as(js_code).await?;
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    /// 截取整页 PNG
    pub async fn screenshot_png(&self) -> AdapterResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        Ok(self.page.screenshot(params).await?)
    }
}

#[async_trait]
impl PageProbe for PageDriver {
    async fn probe_css(&self, selector: &str) -> AdapterResult<ProbeOutcome> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) {{ return {{ found: false, interactable: false }}; }}
                const style = window.getComputedStyle(el);
                const visible = !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)
                    && style.visibility !== 'hidden' && style.display !== 'none';
                const enabled = !el.disabled;
                return {{ found: true, interactable: visible && enabled }};
            }})()
            "#,
            sel = js_string(selector),
        );

        let reply: ProbeReply = self.eval_as(js_code).await?;
        Ok(reply_to_outcome(reply))
    }

    async fn probe_text(&self, needle: &str) -> AdapterResult<ProbeOutcome> {
        let js_code = format!(
            r#"
            (() => {{
                const needle = {needle};
                const nodes = document.querySelectorAll('{scan}');
                for (const el of nodes) {{
                    const text = (el.innerText || el.value || '').trim();
                    if (!text.includes(needle)) {{ continue; }}
                    const style = window.getComputedStyle(el);
                    const visible = !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)
                        && style.visibility !== 'hidden' && style.display !== 'none';
                    const enabled = !el.disabled;
                    return {{ found: true, interactable: visible && enabled }};
                }}
                return {{ found: false, interactable: false }};
            }})()
            "#,
            needle = js_string(needle),
            scan = CLICKABLE_SCAN,
        );

        let reply: ProbeReply = self.eval_as(js_code).await?;
        Ok(reply_to_outcome(reply))
    }
}

fn reply_to_outcome(reply: ProbeReply) -> ProbeOutcome {
    match (reply.found, reply.interactable) {
        (false, _) => ProbeOutcome::Missing,
        (true, false) => ProbeOutcome::NotInteractable,
        (true, true) => ProbeOutcome::Interactable,
    }
}

/// 把任意文本安全地嵌入 JS 源码（转义成字符串字面量）
fn js_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_escapes_quotes_and_newlines() {
        assert_eq!(js_string(r#"a"b"#), r#""a\"b""#);
        assert_eq!(js_string("line1\nline2"), r#""line1\nline2""#);
    }

    #[test]
    fn probe_reply_maps_to_outcome() {
        assert_eq!(
            reply_to_outcome(ProbeReply {
                found: false,
                interactable: false
            }),
            ProbeOutcome::Missing
        );
        assert_eq!(
            reply_to_outcome(ProbeReply {
                found: true,
                interactable: false
            }),
            ProbeOutcome::NotInteractable
        );
        assert_eq!(
            reply_to_outcome(ProbeReply {
                found: true,
                interactable: true
            }),
            ProbeOutcome::Interactable
        );
    }
}
