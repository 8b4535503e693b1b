//! Heaven 系门户适配器
//!
//! 能力最全的参考实现：资料、档期、日记，外加"イチオシ更新"
//! 刷新按钮和剩余次数计数器。管理页普遍使用 id 命名的表单元素，
//! 但改版后部分页面换成了 name 属性，候选列表按新旧顺序排列。

use async_trait::async_trait;
use tracing::{debug, info};

use crate::adapters::{AdapterCore, PlatformAdapter};
use crate::error::AdapterResult;
use crate::models::{
    Capability, CounterReading, DiaryPost, ProfileUpdate, ScheduleUpdate, SelectorStrategy,
};
use crate::services::LoginLocators;
use crate::workflow::counter::parse_counter;

const CAPABILITIES: &[Capability] = &[
    Capability::Login,
    Capability::UpdateProfile,
    Capability::UpdateSchedule,
    Capability::PostDiary,
    Capability::ReadCounter,
    Capability::TriggerRefresh,
];

pub struct HeavenAdapter {
    core: AdapterCore,
}

impl HeavenAdapter {
    pub fn new(core: AdapterCore) -> Self {
        Self { core }
    }

    fn login_locators() -> LoginLocators {
        LoginLocators {
            username: vec![
                SelectorStrategy::css("#loginId"),
                SelectorStrategy::attr("name", "account_id"),
                SelectorStrategy::css("input[name='id']"),
            ],
            password: vec![
                SelectorStrategy::css("#loginPw"),
                SelectorStrategy::attr("name", "password"),
            ],
            submit: vec![
                SelectorStrategy::css("button[type='submit']"),
                SelectorStrategy::text("ログイン"),
            ],
            login_marker: "/admin/login".to_string(),
            error_marker: "loginError".to_string(),
        }
    }
}

#[async_trait]
impl PlatformAdapter for HeavenAdapter {
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

        self.core.navigate(OP, "/admin/girl/profile").await?;
        self.core
            .fill_role(
                OP,
                "girl_name",
                &[
                    SelectorStrategy::css("#girl_name"),
                    SelectorStrategy::attr("name", "girl_name"),
                ],
                &data.name,
            )
            .await?;

        if let Some(catchphrase) = &data.catchphrase {
            self.core
                .fill_role_if_present(
                    OP,
                    "catchphrase",
                    &[
                        SelectorStrategy::css("#catch_copy"),
                        SelectorStrategy::attr("name", "catch_copy"),
                    ],
                    catchphrase,
                )
                .await?;
        }
        if let Some(message) = &data.message {
            self.core
                .fill_role_if_present(
                    OP,
                    "message",
                    &[
                        SelectorStrategy::css("#pr_text"),
                        SelectorStrategy::attr("name", "pr_text"),
                    ],
                    message,
                )
                .await?;
        }

        self.core
            .click_role(
                OP,
                "submit",
                &[
                    SelectorStrategy::css("#profile_submit"),
                    SelectorStrategy::text("更新する"),
                ],
            )
            .await?;

        let verified = self.core.verify_success(OP, "更新しました").await;
        self.core.capture("profile_update").await;
        verified
    }

    async fn update_schedule(&mut self, data: &ScheduleUpdate) -> AdapterResult<()> {
        const OP: &str = "update_schedule";
        info!("[{}] 📅 更新档期: {} 天", self.name(), data.entries.len());

        self.core.navigate(OP, "/admin/schedule/weekly").await?;

        // 周间表单按日期命名输入框
        for entry in &data.entries {
            self.core
                .fill_role(
                    OP,
                    "schedule_start",
                    &[SelectorStrategy::attr(
                        "name",
                        format!("plan[{}][start]", entry.date),
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
                        format!("plan[{}][end]", entry.date),
                    )],
                    &entry.end,
                )
                .await?;
            if let Some(note) = &entry.note {
                self.core
                    .fill_role_if_present(
                        OP,
                        "schedule_note",
                        &[SelectorStrategy::attr(
                            "name",
                            format!("plan[{}][note]", entry.date),
                        )],
                        note,
                    )
                    .await?;
            }
        }

        self.core
            .click_role(
                OP,
                "submit",
                &[
                    SelectorStrategy::css("#schedule_submit"),
                    SelectorStrategy::text("書き換える"),
                ],
            )
            .await?;

        let verified = self
            .core
            .verify_success(OP, "スケジュールを更新しました")
            .await;
        self.core.capture("schedule_update").await;
        verified
    }

    async fn post_diary(&mut self, data: &DiaryPost) -> AdapterResult<()> {
        const OP: &str = "post_diary";
        info!("[{}] 📔 投稿日记: {}", self.name(), data.title);

        self.core.navigate(OP, "/admin/diary/new").await?;
        self.core
            .fill_role(
                OP,
                "diary_title",
                &[
                    SelectorStrategy::css("#diary_title"),
                    SelectorStrategy::attr("name", "title"),
                ],
                &data.title,
            )
            .await?;
        self.core
            .fill_role(
                OP,
                "diary_body",
                &[
                    SelectorStrategy::css("#diary_body"),
                    SelectorStrategy::attr("name", "body"),
                ],
                &data.body,
            )
            .await?;

        self.core
            .click_role(
                OP,
                "submit",
                &[
                    SelectorStrategy::css("#diary_submit"),
                    SelectorStrategy::text("投稿する"),
                ],
            )
            .await?;

        let verified = self.core.verify_success(OP, "投稿が完了しました").await;
        self.core.capture("diary_post").await;
        verified
    }

    async fn read_counter(&mut self) -> AdapterResult<CounterReading> {
        const OP: &str = "read_counter";

        // 每次读取都重新加载管理页，页面内的数值可能是陈旧缓存
        self.core.navigate(OP, "/admin/top").await?;

        let text = self
            .core
            .text_of_role(
                OP,
                "refresh_counter",
                &[
                    SelectorStrategy::css("#refresh_counter"),
                    SelectorStrategy::css(".refresh-count"),
                    SelectorStrategy::css("td.refresh_count"),
                ],
            )
            .await?;

        let reading = match text {
            Some(text) => {
                let reading = parse_counter(&text);
                debug!("[{}] 计数器文本 {:?} -> {:?}", self.name(), text, reading);
                reading
            }
            None => {
                debug!("[{}] 页面上找不到计数器元素", self.name());
                CounterReading::Unknown
            }
        };
        Ok(reading)
    }

    async fn trigger_refresh(&mut self) -> AdapterResult<()> {
        const OP: &str = "trigger_refresh";
        info!("[{}] 🔄 触发イチオシ更新", self.name());

        self.core.navigate(OP, "/admin/top").await?;
        // 点击会弹出确认对话框，会话级自动接受策略兜住
        self.core
            .click_role(
                OP,
                "refresh_button",
                &[
                    SelectorStrategy::css("#refresh_button"),
                    SelectorStrategy::text("イチオシ更新"),
                    SelectorStrategy::text("更新する"),
                ],
            )
            .await?;

        self.core.capture("refresh_attempt").await;
        Ok(())
    }

    fn last_evidence(&self) -> Option<std::path::PathBuf> {
        self.core.last_evidence()
    }

    async fn close(&mut self) {
        self.core.close().await;
    }
}
