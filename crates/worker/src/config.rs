use std::time::Duration;

/// Worker process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Pause between queue polls when the queue is empty.
    pub poll_interval: Duration,
    /// Number of dispatcher loops claiming work concurrently.
    pub concurrency: usize,
    /// How often the scheduler checks for due sweeps.
    pub scheduler_tick: Duration,
    pub retention_days: i64,
    pub spend_max_attempts: u32,
    pub sweep_max_attempts: u32,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `DATABASE_URL`            | required |
    /// | `WORKER_POLL_INTERVAL_MS` | `500`   |
    /// | `WORKER_CONCURRENCY`      | `4`     |
    /// | `SCHEDULER_TICK_SECS`     | `30`    |
    /// | `SPEND_RETENTION_DAYS`    | `90`    |
    /// | `SPEND_MAX_ATTEMPTS`      | `5`     |
    /// | `SWEEP_MAX_ATTEMPTS`      | `3`     |
    ///
    /// Panics on missing or unparsable values; misconfiguration should stop
    /// startup.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        Self {
            database_url,
            poll_interval: Duration::from_millis(env_or("WORKER_POLL_INTERVAL_MS", 500)),
            concurrency: env_or::<usize>("WORKER_CONCURRENCY", 4).max(1),
            scheduler_tick: Duration::from_secs(env_or::<u64>("SCHEDULER_TICK_SECS", 30).max(1)),
            retention_days: env_or("SPEND_RETENTION_DAYS", 90),
            spend_max_attempts: env_or("SPEND_MAX_ATTEMPTS", 5),
            sweep_max_attempts: env_or("SWEEP_MAX_ATTEMPTS", 3),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => parse_or_panic(key, &raw),
        Err(_) => default,
    }
}

fn parse_or_panic<T: std::str::FromStr>(key: &str, raw: &str) -> T {
    raw.trim()
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid number, got {raw:?}"))
}
