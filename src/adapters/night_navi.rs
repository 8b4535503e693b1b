//! NightNavi 门户适配器
//!
//! 现代 SPA 风格的管理后台，元素按 css class 定位。
//! 开放资料与档期编辑，日记和刷新配额不在站点功能内。

use async_trait::async_trait;
use tracing::info;

use crate::adapters::{AdapterCore, PlatformAdapter};
use crate::error::AdapterResult;
use crate::models::{Capability, ProfileUpdate, ScheduleUpdate, SelectorStrategy};
use crate::services::LoginLocators;

const CAPABILITIES: &[Capability] = &[
    Capability::Login,
    Capability::UpdateProfile,
    Capability::UpdateSchedule,
];

pub struct NightNaviAdapter {
    core: AdapterCore,
}

impl NightNaviAdapter {
    pub fn new(core: AdapterCore) -> Self {
        Self { core }
    }

    fn login_locators() -> LoginLocators {
        LoginLocators {
            username: vec![
                SelectorStrategy::css(".login-form .input-id"),
                SelectorStrategy::attr("name", "login_id"),
            ],
            password: vec![
                SelectorStrategy::css(".login-form .input-pass"),
                SelectorStrategy::attr("name", "login_pass"),
            ],
            submit: vec![
                SelectorStrategy::css(".login-form .btn-login"),
                SelectorStrategy::text("ログイン"),
            ],
            login_marker: "/login".to_string(),
            error_marker: "failed".to_string(),
        }
    }
}

#[async_trait]
impl PlatformAdapter for NightNaviAdapter {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn capabilities(&self) -> &[Capability] {
        CAPABILITIES
    }

    async fn login(&mut self) -> AdapterResult<()> {
        self.core.login(&Self::login_locators()).await
    }

    async fn update_profile(&mut self, data: &ProfileUpdate) -> AdapterResult<()> {
        const OP: &str = "update_profile";
        info!("[{}] 📝 更新资料: {}", self.name(), data.name);

        self.core.navigate(OP, "/admin/cast/profile").await?;
        self.core
            .fill_role(
                OP,
                "cast_name",
                &[
                    SelectorStrategy::css(".profile-form .cast-name"),
                    SelectorStrategy::attr("name", "cast_name"),
                ],
                &data.name,
            )
            .await?;

        if let Some(catchphrase) = &data.catchphrase {
            self.core
                .fill_role_if_present(
                    OP,
                    "catchphrase",
                    &[SelectorStrategy::css(".profile-form .cast-catch")],
                    catchphrase,
                )
                .await?;
        }
        if let Some(message) = &data.message {
            self.core
                .fill_role_if_present(
                    OP,
                    "message",
                    &[SelectorStrategy::css(".profile-form .cast-message")],
                    message,
                )
                .await?;
        }

        self.core
            .click_role(
                OP,
                "submit",
                &[
                    SelectorStrategy::css(".profile-form .btn-save"),
                    SelectorStrategy::text("保存"),
                ],
            )
            .await?;

        let verified = self.core.verify_success(OP, "保存しました").await;
        self.core.capture("profile_update").await;
        verified
    }

    async fn update_schedule(&mut self, data: &ScheduleUpdate) -> AdapterResult<()> {
        const OP: &str = "update_schedule";
        info!("[{}] 📅 更新档期: {} 天", self.name(), data.entries.len());

        self.core.navigate(OP, "/admin/schedule/edit").await?;

        for entry in &data.entries {
            self.core
                .fill_role(
                    OP,
                    "schedule_start",
                    &[SelectorStrategy::attr(
                        "name",
                        format!("schedule[{}][start]", entry.date),
                    )],
                    &entry.start,
                )
                .await?;
            self.core
                .fill_role(
                    OP,
                    "schedule_end",
                    &[SelectorStrategy::attr(
                        "name",
                        format!("schedule[{}][end]", entry.date),
                    )],
                    &entry.end,
                )
                .await?;
        }

        self.core
            .click_role(
                OP,
                "submit",
                &[
                    SelectorStrategy::css(".schedule-form .btn-save"),
                    SelectorStrategy::text("保存する"),
                ],
            )
            .await?;

        let verified = self
            .core
            .verify_success(OP, "スケジュールを保存しました")
            .await;
        self.core.capture("schedule_update").await;
        verified
    }

    fn last_evidence(&self) -> Option<std::path::PathBuf> {
        self.core.last_evidence()
    }

    async fn close(&mut self) {
        self.core.close().await;
    }
}
