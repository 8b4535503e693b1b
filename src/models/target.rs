//! 目标站点描述
//!
//! 每个第三方门户站点一条记录，载入后不可变。

use crate::models::credential::Credential;
use serde::Deserialize;

/// 适配器能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Login,
    UpdateProfile,
    UpdateSchedule,
    PostDiary,
    ReadCounter,
    TriggerRefresh,
}

impl Capability {
    /// 能力名（用于日志和 Unsupported 错误详情）
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Login => "login",
            Capability::UpdateProfile => "update_profile",
            Capability::UpdateSchedule => "update_schedule",
            Capability::PostDiary => "post_diary",
            Capability::ReadCounter => "read_counter",
            Capability::TriggerRefresh => "trigger_refresh",
        }
    }
}

/// 目标站点描述
///
/// `kind` 决定由哪个适配器实现来驱动该站点，`capabilities` 声明站点侧
/// 实际开放的能力（与适配器实现的能力集取交集后才可调用）。
#[derive(Debug, Clone, Deserialize)]
pub struct TargetDescriptor {
    /// 站点名（分发请求中引用的键）
    pub name: String,
    /// 适配器实现类型（heaven / deli_town / night_navi）
    pub kind: String,
    /// 站点首页
    pub base_url: String,
    /// 登录页
    pub login_url: String,
    /// 站点开放的能力
    pub capabilities: Vec<Capability>,
    /// 优先级（数字越小越先处理）
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// 该站点的登录凭证
    pub credential: Credential,
}

fn default_priority() -> u8 {
    10
}

impl TargetDescriptor {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// 拼接站点内路径
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_handles_slashes() {
        let target = TargetDescriptor {
            name: "heaven".to_string(),
            kind: "heaven".to_string(),
            base_url: "https://heaven.example/".to_string(),
            login_url: "https://heaven.example/login".to_string(),
            capabilities: vec![Capability::UpdateProfile],
            priority: 1,
            credential: Credential::new("a", "b"),
        };
        assert_eq!(
            target.url_for("/manage/profile"),
            "https://heaven.example/manage/profile"
        );
        assert!(target.supports(Capability::UpdateProfile));
        assert!(!target.supports(Capability::TriggerRefresh));
    }
}
