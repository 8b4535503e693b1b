//! 元素定位候选
//!
//! 每个语义角色（"用户名输入框"、"提交按钮"）配一组按优先级排列的定位策略。
//! 站点标记随时间漂移，单一硬编码选择器过于脆弱，解析时按序降级尝试。
//! 纯配置数据，只读。

use serde::Deserialize;

/// 单个定位策略
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum SelectorStrategy {
    /// CSS 选择器
    Css { selector: String },
    /// 属性完全匹配（翻译为 `[name="value"]`）
    Attr { name: String, value: String },
    /// 可交互元素的可见文本包含匹配
    Text { needle: String },
}

impl SelectorStrategy {
    pub fn css(selector: impl Into<String>) -> Self {
        SelectorStrategy::Css {
            selector: selector.into(),
        }
    }

    pub fn attr(name: impl Into<String>, value: impl Into<String>) -> Self {
        SelectorStrategy::Attr {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn text(needle: impl Into<String>) -> Self {
        SelectorStrategy::Text {
            needle: needle.into(),
        }
    }

    /// 能翻译成 CSS 的策略返回选择器文本，文本匹配策略返回 None
    pub fn as_css(&self) -> Option<String> {
        match self {
            SelectorStrategy::Css { selector } => Some(selector.clone()),
            SelectorStrategy::Attr { name, value } => {
                Some(format!("[{}=\"{}\"]", name, value))
            }
            SelectorStrategy::Text { .. } => None,
        }
    }

    /// 日志显示用的简短描述
    pub fn describe(&self) -> String {
        match self {
            SelectorStrategy::Css { selector } => format!("css({})", selector),
            SelectorStrategy::Attr { name, value } => format!("attr({}={})", name, value),
            SelectorStrategy::Text { needle } => format!("text({})", needle),
        }
    }
}
