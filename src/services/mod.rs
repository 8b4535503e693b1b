//! 业务能力层（Services）
//!
//! 描述"我能做什么"：供给代理、维持会话、落盘证据。
//! 每个服务只持有一种关注点，不编排流程。

pub mod evidence;
pub mod proxy_selector;
pub mod session;

pub use evidence::EvidenceWriter;
pub use proxy_selector::ProxySelector;
pub use session::{LoginLocators, SessionController, SessionHandle, SessionState};
