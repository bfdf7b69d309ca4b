use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adpace_worker::config::WorkerConfig;
use adpace_worker::dispatcher::Dispatcher;
use adpace_worker::scheduler::Scheduler;

/// How long in-flight items get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adpace_worker=debug,adpace_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        concurrency = config.concurrency,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        scheduler_tick_secs = config.scheduler_tick.as_secs(),
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = adpace_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    adpace_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    adpace_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let dispatcher = std::sync::Arc::new(Dispatcher::new(pool.clone(), &config));
    if let Err(e) = dispatcher.release_stale().await {
        tracing::error!(error = %e, "Failed to requeue stale work items");
    }

    // --- Background loops ---
    let cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();

    for worker in 0..config.concurrency {
        let dispatcher = std::sync::Arc::clone(&dispatcher);
        let cancel = cancel.clone();
        tasks.spawn(async move { dispatcher.run(worker, cancel).await });
    }

    let scheduler = Scheduler::new(pool.clone(), &config);
    let scheduler_cancel = cancel.clone();
    tasks.spawn(async move { scheduler.run(scheduler_cancel).await });

    shutdown_signal().await;

    // --- Shutdown ---
    cancel.cancel();
    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Shutdown grace period elapsed, abandoning in-flight work items"
        );
        tasks.abort_all();
    }

    pool.close().await;
    tracing::info!("Worker shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), stopping worker");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, stopping worker");
        }
    }
}
