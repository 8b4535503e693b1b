/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的目标站点数量（分发扇出上限）
    pub max_concurrent_targets: usize,
    /// 单次分发的总截止时间（秒），超时的站点记为 TimeoutFailure
    pub dispatch_deadline_secs: u64,
    /// 单个页面操作的超时上限（秒）
    pub operation_timeout_secs: u64,
    /// UI 操作后的稳定等待（毫秒），等待客户端渲染完成
    pub settle_delay_ms: u64,
    /// 配额刷新循环的尝试次数上限
    pub max_refresh_attempts: u32,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 浏览器可执行文件路径（空则使用系统默认）
    pub chrome_executable: Option<String>,
    /// 站点/凭证/代理清单文件
    pub site_config_file: String,
    /// 任务文件存放目录
    pub jobs_folder: String,
    /// 证据（截图 + JSON 报告）输出目录
    pub evidence_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 浏览器语言（Accept-Language）
    pub locale: String,
    /// 浏览器时区
    pub timezone: String,
    /// 浏览器 User-Agent
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_targets: 3,
            dispatch_deadline_secs: 600,
            operation_timeout_secs: 30,
            settle_delay_ms: 800,
            max_refresh_attempts: 20,
            headless: true,
            chrome_executable: None,
            site_config_file: "sites.toml".to_string(),
            jobs_folder: "jobs".to_string(),
            evidence_folder: "evidence".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            locale: "ja-JP".to_string(),
            timezone: "Asia/Tokyo".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_targets: std::env::var("MAX_CONCURRENT_TARGETS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_targets),
            dispatch_deadline_secs: std::env::var("DISPATCH_DEADLINE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dispatch_deadline_secs),
            operation_timeout_secs: std::env::var("OPERATION_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.operation_timeout_secs),
            settle_delay_ms: std::env::var("SETTLE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.settle_delay_ms),
            max_refresh_attempts: std::env::var("MAX_REFRESH_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_refresh_attempts),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            site_config_file: std::env::var("SITE_CONFIG_FILE").unwrap_or(default.site_config_file),
            jobs_folder: std::env::var("JOBS_FOLDER").unwrap_or(default.jobs_folder),
            evidence_folder: std::env::var("EVIDENCE_FOLDER").unwrap_or(default.evidence_folder),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            locale: std::env::var("BROWSER_LOCALE").unwrap_or(default.locale),
            timezone: std::env::var("BROWSER_TIMEZONE").unwrap_or(default.timezone),
            user_agent: std::env::var("BROWSER_USER_AGENT").unwrap_or(default.user_agent),
        }
    }

    /// 单个页面操作的超时时长
    pub fn operation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.operation_timeout_secs)
    }

    /// UI 操作后的稳定等待时长
    pub fn settle_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_delay_ms)
    }

    /// 分发截止时长
    pub fn dispatch_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.dispatch_deadline_secs)
    }
}
