//! 元素定位解析 - 基础设施层
//!
//! 给定一个语义角色和一组按序排列的候选策略，对当前页面逐个尝试，
//! 返回第一个存在且可交互的命中。全部落空返回 [`Resolution::NotFound`]，
//! 这是正常结果而不是错误：目标站点可能根本没有该角色的元素，
//! 是否致命由调用方自行判断。除只读查询外没有任何副作用。

use async_trait::async_trait;
use tracing::debug;

use crate::error::AdapterResult;
use crate::models::SelectorStrategy;

/// 只读页面探测能力
///
/// 定位解析只依赖这一层抽象；生产实现由 `PageDriver` 提供，
/// 测试用假探测器即可验证解析顺序。
#[async_trait]
pub trait PageProbe: Send + Sync {
    /// 探测 CSS 选择器命中的元素
    async fn probe_css(&self, selector: &str) -> AdapterResult<ProbeOutcome>;
    /// 探测可见文本包含 needle 的可交互元素
    async fn probe_text(&self, needle: &str) -> AdapterResult<ProbeOutcome>;
}

/// 探测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 元素不存在
    Missing,
    /// 元素存在但不可交互（不可见或 disabled）
    NotInteractable,
    /// 存在且可交互
    Interactable,
}

/// 解析命中的定位方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocator {
    /// 以 CSS 选择器交互
    Css(String),
    /// 以文本匹配交互
    Text(String),
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResolvedLocator),
    NotFound,
}

impl Resolution {
    pub fn into_option(self) -> Option<ResolvedLocator> {
        match self {
            Resolution::Found(locator) => Some(locator),
            Resolution::NotFound => None,
        }
    }
}

/// 按声明顺序解析候选列表
///
/// 空列表直接返回 `NotFound`，不触碰页面。
pub async fn resolve(
    probe: &dyn PageProbe,
    role: &str,
    candidates: &[SelectorStrategy],
) -> AdapterResult<Resolution> {
    if candidates.is_empty() {
        debug!("角色 {} 没有候选定位，返回 NotFound", role);
        return Ok(Resolution::NotFound);
    }

    for candidate in candidates {
        let outcome = match candidate.as_css() {
            Some(css) => probe.probe_css(&css).await?,
            None => match candidate {
                SelectorStrategy::Text { needle } => probe.probe_text(needle).await?,
                _ => unreachable!("as_css 为 None 的只有 Text 策略"),
            },
        };

        debug!("角色 {} 候选 {} -> {:?}", role, candidate.describe(), outcome);

        if outcome == ProbeOutcome::Interactable {
            let resolved = match candidate.as_css() {
                Some(css) => ResolvedLocator::Css(css),
                None => match candidate {
                    SelectorStrategy::Text { needle } => ResolvedLocator::Text(needle.clone()),
                    _ => unreachable!(),
                },
            };
            return Ok(Resolution::Found(resolved));
        }
    }

    debug!("角色 {} 的 {} 个候选全部落空", role, candidates.len());
    Ok(Resolution::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 记录探测顺序的假探测器：只有 `present` 中的选择器可交互
    struct FakeProbe {
        present: Vec<String>,
        probed: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn new(present: &[&str]) -> Self {
            Self {
                present: present.iter().map(|s| s.to_string()).collect(),
                probed: Mutex::new(Vec::new()),
            }
        }

        fn probed(&self) -> Vec<String> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageProbe for FakeProbe {
        async fn probe_css(&self, selector: &str) -> AdapterResult<ProbeOutcome> {
            self.probed.lock().unwrap().push(selector.to_string());
            if self.present.iter().any(|p| p == selector) {
                Ok(ProbeOutcome::Interactable)
            } else {
                Ok(ProbeOutcome::Missing)
            }
        }

        async fn probe_text(&self, needle: &str) -> AdapterResult<ProbeOutcome> {
            self.probed.lock().unwrap().push(format!("text:{}", needle));
            if self.present.iter().any(|p| p == needle) {
                Ok(ProbeOutcome::Interactable)
            } else {
                Ok(ProbeOutcome::Missing)
            }
        }
    }

    #[tokio::test]
    async fn empty_candidates_return_not_found_without_probing() {
        let probe = FakeProbe::new(&["#anything"]);
        let resolution = resolve(&probe, "username", &[]).await.expect("不应报错");
        assert_eq!(resolution, Resolution::NotFound);
        assert!(probe.probed().is_empty());
    }

    #[tokio::test]
    async fn candidates_are_tried_in_declared_order() {
        // 页面上只有第二个候选存在
        let probe = FakeProbe::new(&["[name=\"login_id\"]"]);
        let candidates = vec![
            SelectorStrategy::css("#loginId"),
            SelectorStrategy::attr("name", "login_id"),
            SelectorStrategy::css("input.login"),
        ];

        let resolution = resolve(&probe, "username", &candidates)
            .await
            .expect("不应报错");

        assert_eq!(
            resolution,
            Resolution::Found(ResolvedLocator::Css("[name=\"login_id\"]".to_string()))
        );
        // 第一个候选先被探测，命中后停止，第三个从未被探测
        assert_eq!(probe.probed(), vec!["#loginId", "[name=\"login_id\"]"]);
    }

    #[tokio::test]
    async fn all_missing_returns_not_found() {
        let probe = FakeProbe::new(&[]);
        let candidates = vec![
            SelectorStrategy::css("#a"),
            SelectorStrategy::text("ログイン"),
        ];
        let resolution = resolve(&probe, "submit", &candidates)
            .await
            .expect("不应报错");
        assert_eq!(resolution, Resolution::NotFound);
        assert_eq!(probe.probed().len(), 2);
    }

    #[tokio::test]
    async fn text_candidate_resolves_to_text_locator() {
        let probe = FakeProbe::new(&["更新する"]);
        let candidates = vec![
            SelectorStrategy::css("#submit"),
            SelectorStrategy::text("更新する"),
        ];
        let resolution = resolve(&probe, "submit", &candidates)
            .await
            .expect("不应报错");
        assert_eq!(
            resolution,
            Resolution::Found(ResolvedLocator::Text("更新する".to_string()))
        );
    }
}
