pub mod credential;
pub mod job;
pub mod loaders;
pub mod locator;
pub mod payload;
pub mod proxy;
pub mod report;
pub mod target;

pub use credential::Credential;
pub use job::DistributionJob;
pub use loaders::{load_all_jobs, load_site_config, SiteConfig};
pub use locator::SelectorStrategy;
pub use payload::{ContentPayload, DiaryPost, ProfileUpdate, ScheduleEntry, ScheduleUpdate};
pub use proxy::{ProxyDescriptor, RawProxyEntry};
pub use report::{
    CounterReading, DistributionReport, DistributionResult, QuotaAttemptLog, QuotaRunReport,
    QuotaRunStatus,
};
pub use target::{Capability, TargetDescriptor};
