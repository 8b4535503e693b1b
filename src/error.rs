//! 应用程序错误类型
//!
//! 能力层面的失败统一收敛为 [`AdapterError`]，在适配器边界转成带类型的结果，
//! 绝不以未处理的异常形式向上逃逸（否则会中断其他站点的分发）。

use thiserror::Error;

/// 适配器能力错误
///
/// 每个变体对应一类明确的失败场景，`kind()` 返回稳定的分类名，
/// 用于分发报告和证据日志。
#[derive(Debug, Error)]
pub enum AdapterError {
    /// 无法获取浏览器上下文，本次运行无法继续
    #[error("无法启动浏览器上下文: {reason}")]
    LaunchFailure { reason: String },

    /// 凭证被拒绝或登录后仍停留在登录页（可由调用方恢复）
    #[error("登录失败 ({target}): {reason}")]
    AuthenticationFailure { target: String, reason: String },

    /// 登录表单缺少必需的输入框（不做任何猜测）
    #[error("登录表单缺少 {role} 输入框")]
    MissingLoginField { role: String },

    /// 能力调用顺序错误：未登录就执行操作
    #[error("尚未登录，无法执行 {operation}")]
    NotAuthenticated { operation: String },

    /// 该适配器未实现此能力
    #[error("适配器 {target} 不支持 {capability}")]
    Unsupported { target: String, capability: String },

    /// 请求了未注册的目标站点
    #[error("未注册的目标站点: {target}")]
    AdapterNotFound { target: String },

    /// 有界等待超时
    #[error("操作超时 ({operation}, 上限 {timeout_secs} 秒)")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    /// 页面文本/计数器与预期形状不符（多半是站点改版）
    #[error("页面状态无法解析: {detail}")]
    UnparsableState { detail: String },

    /// 导航失败
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },

    /// 页面自动化驱动底层错误
    #[error("浏览器驱动错误: {0}")]
    Driver(#[from] chromiumoxide::error::CdpError),
}

impl AdapterError {
    /// 返回稳定的错误分类名
    ///
    /// 写入 `DistributionResult.error` 和证据日志，调用方按前缀匹配即可，
    /// 不依赖中文描述文本。
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::LaunchFailure { .. } => "LaunchFailure",
            AdapterError::AuthenticationFailure { .. } => "AuthenticationFailure",
            AdapterError::MissingLoginField { .. } => "MissingLoginField",
            AdapterError::NotAuthenticated { .. } => "NotAuthenticated",
            AdapterError::Unsupported { .. } => "Unsupported",
            AdapterError::AdapterNotFound { .. } => "AdapterNotFound",
            AdapterError::Timeout { .. } => "TimeoutFailure",
            AdapterError::UnparsableState { .. } => "UnparsableState",
            AdapterError::Navigation { .. } => "NavigationFailure",
            AdapterError::Driver(_) => "DriverFailure",
        }
    }

    /// 报告用的完整描述："分类名: 详情"
    pub fn report_detail(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }

    /// 会话是否因本错误而失效（必须销毁重建，不允许复用）
    pub fn invalidates_session(&self) -> bool {
        matches!(
            self,
            AdapterError::Timeout { .. }
                | AdapterError::Navigation { .. }
                | AdapterError::Driver(_)
                | AdapterError::LaunchFailure { .. }
        )
    }
}

/// 适配器能力结果类型
pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_for_report_matching() {
        let err = AdapterError::AuthenticationFailure {
            target: "heaven".to_string(),
            reason: "凭证被拒绝".to_string(),
        };
        assert_eq!(err.kind(), "AuthenticationFailure");
        assert!(err.report_detail().starts_with("AuthenticationFailure: "));

        let err = AdapterError::Timeout {
            operation: "goto".to_string(),
            timeout_secs: 30,
        };
        assert_eq!(err.kind(), "TimeoutFailure");
    }

    #[test]
    fn fatal_errors_invalidate_session() {
        assert!(AdapterError::Timeout {
            operation: "wait_for_navigation".to_string(),
            timeout_secs: 30,
        }
        .invalidates_session());

        assert!(!AdapterError::Unsupported {
            target: "deli-town".to_string(),
            capability: "trigger_refresh".to_string(),
        }
        .invalidates_session());
    }
}
