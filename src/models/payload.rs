//! 分发内容载荷
//!
//! 调用方选定变体，分发前做必填字段校验。

use crate::models::target::Capability;
use serde::Deserialize;

/// 资料更新
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    /// 艺名（必填）
    pub name: String,
    /// 一句话介绍
    pub catchphrase: Option<String>,
    /// 详细介绍文
    pub message: Option<String>,
}

/// 单日出勤档期
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleEntry {
    /// 日期（站点表单使用的 YYYY-MM-DD 文本）
    pub date: String,
    /// 出勤开始时刻
    pub start: String,
    /// 出勤结束时刻
    pub end: String,
    /// 备注
    pub note: Option<String>,
}

/// 档期更新
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleUpdate {
    pub entries: Vec<ScheduleEntry>,
}

/// 日记投稿
#[derive(Debug, Clone, Deserialize)]
pub struct DiaryPost {
    /// 标题（必填）
    pub title: String,
    /// 正文（必填）
    pub body: String,
}

/// 分发内容载荷（三选一）
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPayload {
    ProfileUpdate(ProfileUpdate),
    ScheduleUpdate(ScheduleUpdate),
    DiaryPost(DiaryPost),
}

impl ContentPayload {
    /// 该载荷需要适配器具备的能力
    pub fn required_capability(&self) -> Capability {
        match self {
            ContentPayload::ProfileUpdate(_) => Capability::UpdateProfile,
            ContentPayload::ScheduleUpdate(_) => Capability::UpdateSchedule,
            ContentPayload::DiaryPost(_) => Capability::PostDiary,
        }
    }

    /// 载荷种类名（用于日志）
    pub fn kind_name(&self) -> &'static str {
        self.required_capability().as_str()
    }

    /// 分发前的必填字段校验
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ContentPayload::ProfileUpdate(p) => {
                if p.name.trim().is_empty() {
                    return Err("资料更新缺少艺名".to_string());
                }
            }
            ContentPayload::ScheduleUpdate(s) => {
                if s.entries.is_empty() {
                    return Err("档期更新不能为空".to_string());
                }
                for entry in &s.entries {
                    if entry.date.trim().is_empty()
                        || entry.start.trim().is_empty()
                        || entry.end.trim().is_empty()
                    {
                        return Err(format!("档期条目不完整: {:?}", entry));
                    }
                }
            }
            ContentPayload::DiaryPost(d) => {
                if d.title.trim().is_empty() {
                    return Err("日记标题不能为空".to_string());
                }
                if d.body.trim().is_empty() {
                    return Err("日记正文不能为空".to_string());
                }
            }
        }
        Ok(())
    }
}
