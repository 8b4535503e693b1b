//! 证据写入服务 - 业务能力层
//!
//! 只负责"落盘截图和 JSON 报告"能力，不关心流程。
//! 文件名带站点与时间戳，便于事后追溯。

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 证据写入服务
pub struct EvidenceWriter {
    folder: PathBuf,
}

impl EvidenceWriter {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// 确保输出目录存在
    pub async fn ensure_folder(&self) -> Result<()> {
        fs::create_dir_all(&self.folder)
            .await
            .with_context(|| format!("无法创建证据目录: {}", self.folder.display()))?;
        Ok(())
    }

    fn file_path(&self, target: &str, label: &str, ext: &str) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f");
        self.folder
            .join(format!("{}_{}_{}.{}", target, label, timestamp, ext))
    }

    /// 写入截图证据
    pub async fn write_screenshot(
        &self,
        target: &str,
        label: &str,
        png: &[u8],
    ) -> Result<PathBuf> {
        let path = self.file_path(target, label, "png");
        fs::write(&path, png)
            .await
            .with_context(|| format!("无法写入截图: {}", path.display()))?;
        debug!("截图已保存: {}", path.display());
        Ok(path)
    }

    /// 写入结构化 JSON 证据
    pub async fn write_json<T: Serialize>(
        &self,
        target: &str,
        label: &str,
        value: &T,
    ) -> Result<PathBuf> {
        let path = self.file_path(target, label, "json");
        let json_text = serde_json::to_string_pretty(value).context("JSON 序列化失败")?;
        fs::write(&path, json_text)
            .await
            .with_context(|| format!("无法写入报告: {}", path.display()))?;
        debug!("报告已保存: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_json_named_with_target_and_timestamp() {
        let dir = tempfile::tempdir().expect("临时目录创建失败");
        let writer = EvidenceWriter::new(dir.path());
        writer.ensure_folder().await.expect("目录应能创建");

        let path = writer
            .write_json("heaven", "dispatch", &serde_json::json!({ "ok": true }))
            .await
            .expect("写入应成功");

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("heaven_dispatch_"));
        assert!(file_name.ends_with(".json"));

        let content = fs::read_to_string(&path).await.expect("应能读回");
        assert!(content.contains("\"ok\""));
    }

    #[tokio::test]
    async fn writes_screenshot_bytes() {
        let dir = tempfile::tempdir().expect("临时目录创建失败");
        let writer = EvidenceWriter::new(dir.path());
        writer.ensure_folder().await.expect("目录应能创建");

        let path = writer
            .write_screenshot("night-navi", "refresh_attempt", &[0x89, 0x50, 0x4e, 0x47])
            .await
            .expect("写入应成功");
        assert!(path.to_string_lossy().ends_with(".png"));

        let bytes = fs::read(&path).await.expect("应能读回");
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }
}
