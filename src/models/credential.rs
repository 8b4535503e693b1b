//! 登录凭证
//!
//! 凭证在进程启动时随站点清单一次性载入，之后只读。
//! 密钥绝不允许出现在日志、截图命名或结构化输出中。

use serde::Deserialize;
use std::fmt;

/// 一个目标站点的登录凭证
#[derive(Clone, Deserialize)]
pub struct Credential {
    /// 登录标识（店铺 ID / 邮箱等）
    pub identifier: String,
    /// 登录密钥
    pub secret: String,
    /// 站点侧的数字账号 ID（部分站点的管理页 URL 需要）
    pub account_id: Option<u64>,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            account_id: None,
        }
    }
}

// Debug 输出固定打码，避免凭证经由 {:?} 日志泄露
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .field("account_id", &self.account_id)
            .finish()
    }
}
