use arca_core::telemetry::init_telemetry;
use arca_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;
    init_telemetry(&config.environment);

    let (_state, router) = arca_api::setup::initialize_app(config.clone()).await?;

    arca_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
