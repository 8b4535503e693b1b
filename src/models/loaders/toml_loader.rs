use crate::models::job::DistributionJob;
use crate::models::proxy::RawProxyEntry;
use crate::models::target::TargetDescriptor;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 站点清单文件（targets + proxies）
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub targets: Vec<TargetDescriptor>,
    #[serde(default)]
    pub proxies: Vec<RawProxyEntry>,
}

/// 从 TOML 文件载入站点清单
pub async fn load_site_config(path: &Path) -> Result<SiteConfig> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取站点清单: {}", path.display()))?;

    let config: SiteConfig = toml::from_str(&content)
        .with_context(|| format!("无法解析站点清单: {}", path.display()))?;

    if config.targets.is_empty() {
        anyhow::bail!("站点清单中没有任何目标站点: {}", path.display());
    }

    Ok(config)
}

/// 从 TOML 文件载入单个任务
pub async fn load_job(path: &Path) -> Result<DistributionJob> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取任务文件: {}", path.display()))?;

    let job: DistributionJob = toml::from_str(&content)
        .with_context(|| format!("无法解析任务文件: {}", path.display()))?;

    Ok(job)
}

/// 扫描任务目录，载入所有 TOML 任务文件
///
/// 单个文件解析失败只告警跳过，不影响其余任务。
pub async fn load_all_jobs(folder_path: &str) -> Result<Vec<(PathBuf, DistributionJob)>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("任务目录不存在: {}", folder_path);
    }

    let mut jobs = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取任务目录: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载任务: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_job(&path).await {
                Ok(job) => {
                    tracing::info!("成功加载 {} 任务（{} 个站点）", job.kind_name(), job.target_count());
                    jobs.push((path, job));
                }
                Err(e) => {
                    tracing::warn!("加载任务失败 {}: {}", path.display(), e);
                }
            }
        }
    }

    // 文件名排序保证批次顺序稳定
    jobs.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn site_config_parses_targets_and_proxies() {
        let dir = tempfile::tempdir().expect("临时目录创建失败");
        let path = dir.path().join("sites.toml");
        fs::write(
            &path,
            r#"
            [[targets]]
            name = "heaven"
            kind = "heaven"
            base_url = "https://heaven.example"
            login_url = "https://heaven.example/admin/login"
            capabilities = ["update_profile", "post_diary", "read_counter", "trigger_refresh"]
            priority = 1

            [targets.credential]
            identifier = "shop001"
            secret = "pw"
            account_id = 4242

            [[proxies]]
            server = "http://gw1.example:8080"
            username = "u"
            password = "p"
            country = "jp"

            [[proxies]]
            url = "http://u2:p2@gw2.example:8080"
            "#,
        )
        .await
        .expect("写入失败");

        let config = load_site_config(&path).await.expect("清单应能解析");
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].credential.account_id, Some(4242));
        assert_eq!(config.proxies.len(), 2);
    }

    #[tokio::test]
    async fn empty_target_list_is_rejected() {
        let dir = tempfile::tempdir().expect("临时目录创建失败");
        let path = dir.path().join("sites.toml");
        fs::write(&path, "targets = []\n").await.expect("写入失败");
        assert!(load_site_config(&path).await.is_err());
    }

    #[tokio::test]
    async fn broken_job_file_is_skipped() {
        let dir = tempfile::tempdir().expect("临时目录创建失败");
        fs::write(
            dir.path().join("a_ok.toml"),
            r#"
            kind = "refresh"
            targets = ["heaven"]
            "#,
        )
        .await
        .expect("写入失败");
        fs::write(dir.path().join("b_broken.toml"), "kind = ???")
            .await
            .expect("写入失败");

        let jobs = load_all_jobs(dir.path().to_str().unwrap())
            .await
            .expect("扫描应成功");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].1.kind_name(), "refresh");
    }
}
