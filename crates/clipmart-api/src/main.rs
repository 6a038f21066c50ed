use anyhow::Context;
use clipmart_api::setup;
use clipmart_core::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let state = setup::build_state(config.clone()).context("Failed to build application state")?;
    let router = setup::setup_routes(&config, state).context("Failed to set up routes")?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
