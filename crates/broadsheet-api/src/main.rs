use anyhow::Context;
use broadsheet_core::Config;
use broadsheet_infra::{init_telemetry, LogFormat};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_telemetry("broadsheet-api", LogFormat::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let (state, router) = broadsheet_api::initialize_app(config.clone()).await?;

    broadsheet_api::setup::server::start_server(&config, router).await?;

    state.worker.stop();
    Ok(())
}
