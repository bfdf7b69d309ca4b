use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adpace_worker::cli::{self, Cli};
use adpace_worker::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = WorkerConfig::from_env();

    let pool = adpace_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let outcome = cli::run(cli, &pool, &config).await;
    pool.close().await;
    outcome
}
