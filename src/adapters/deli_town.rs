//! DeliTown 门户适配器
//!
//! 老式 PHP 表格页面：元素几乎没有 id，定位以 name 属性和按钮文本为主。
//! 站点只开放资料编辑和日记投稿，没有刷新配额的概念。

use async_trait::async_trait;
use tracing::info;

use crate::adapters::{AdapterCore, PlatformAdapter};
use crate::error::AdapterResult;
use crate::models::{Capability, DiaryPost, ProfileUpdate, SelectorStrategy};
use crate::services::LoginLocators;

const CAPABILITIES: &[Capability] = &[
    Capability::Login,
    Capability::UpdateProfile,
    Capability::PostDiary,
];

pub struct DeliTownAdapter {
    core: AdapterCore,
}

impl DeliTownAdapter {
    pub fn new(core: AdapterCore) -> Self {
        Self { core }
    }

    fn login_locators() -> LoginLocators {
        LoginLocators {
            username: vec![
                SelectorStrategy::attr("name", "shop_login_id"),
                SelectorStrategy::css("input.loginid"),
            ],
            password: vec![
                SelectorStrategy::attr("name", "shop_password"),
                SelectorStrategy::css("input.loginpw"),
            ],
            submit: vec![
                SelectorStrategy::text("ログインする"),
                SelectorStrategy::css("input[type='submit']"),
            ],
            login_marker: "/shop/login".to_string(),
            error_marker: "err=1".to_string(),
        }
    }
}

#[async_trait]
impl PlatformAdapter for DeliTownAdapter {
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

        self.core.navigate(OP, "/shop/admin/girl_edit.php").await?;
        self.core
            .fill_role(
                OP,
                "girl_name",
                &[SelectorStrategy::attr("name", "girl_name")],
                &data.name,
            )
            .await?;

        if let Some(message) = &data.message {
            self.core
                .fill_role_if_present(
                    OP,
                    "girl_comment",
                    &[SelectorStrategy::attr("name", "girl_comment")],
                    message,
                )
                .await?;
        }

        self.core
            .click_role(
                OP,
                "submit",
                &[
                    SelectorStrategy::text("登録する"),
                    SelectorStrategy::css("input[name='regist']"),
                ],
            )
            .await?;

        let verified = self.core.verify_success(OP, "登録が完了しました").await;
        self.core.capture("profile_update").await;
        verified
    }

    async fn post_diary(&mut self, data: &DiaryPost) -> AdapterResult<()> {
        const OP: &str = "post_diary";
        info!("[{}] 📔 投稿日记: {}", self.name(), data.title);

        self.core.navigate(OP, "/shop/admin/diary_input.php").await?;
        self.core
            .fill_role(
                OP,
                "diary_title",
                &[SelectorStrategy::attr("name", "diary_title")],
                &data.title,
            )
            .await?;
        self.core
            .fill_role(
                OP,
                "diary_body",
                &[SelectorStrategy::attr("name", "diary_text")],
                &data.body,
            )
            .await?;

        self.core
            .click_role(
                OP,
                "submit",
                &[
                    SelectorStrategy::text("投稿"),
                    SelectorStrategy::css("input[name='post']"),
                ],
            )
            .await?;

        let verified = self.core.verify_success(OP, "投稿を受け付けました").await;
        self.core.capture("diary_post").await;
        verified
    }

    fn last_evidence(&self) -> Option<std::path::PathBuf> {
        self.core.last_evidence()
    }

    async fn close(&mut self) {
        self.core.close().await;
    }
}
