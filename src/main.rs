use anyhow::Result;
use cast_distributor::orchestrator::App;
use cast_distributor::utils::logging;
use cast_distributor::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
