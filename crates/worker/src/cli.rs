//! Command-line interface for the `adpace` binary.

use std::time::Duration;

use adpace_core::money::{parse_amount, validate_spend_amount};
use adpace_core::schedule::SweepKind;
use adpace_core::types::Timestamp;
use adpace_core::work::{SpendRequest, WorkItem};
use adpace_db::models::status::WorkItemStatus;
use adpace_db::models::work_item::{NewWorkItem, WorkItemRow};
use adpace_db::repositories::{BrandRepo, CampaignRepo, WorkItemRepo};
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::scheduler::enqueue_sweep;

/// How often `record-spend` checks whether its task has finished.
const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// adpace - ad budget pacing and dayparting
#[derive(Debug, Parser)]
#[command(name = "adpace")]
#[command(version)]
#[command(about = "Record spend and drive reconciliation sweeps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a spend event and wait for the outcome
    RecordSpend {
        /// Name of an active brand
        brand_name: String,

        /// Name of an enabled campaign of that brand
        campaign_name: String,

        /// Amount spent, e.g. 12.50
        amount: String,

        /// When the spend happened (RFC 3339); defaults to now
        #[arg(long)]
        datetime: Option<String>,

        /// Seconds to wait for the worker to process the spend
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Queue a reconciliation sweep to run now
    Sweep {
        #[arg(value_enum)]
        kind: SweepArg,
    },

    /// Show the state and result of a queued task
    Task {
        task_id: Uuid,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SweepArg {
    Dayparting,
    Budget,
    DailyReset,
    MonthlyReset,
    Retention,
}

impl From<SweepArg> for SweepKind {
    fn from(arg: SweepArg) -> Self {
        match arg {
            SweepArg::Dayparting => SweepKind::Dayparting,
            SweepArg::Budget => SweepKind::Budget,
            SweepArg::DailyReset => SweepKind::DailyReset,
            SweepArg::MonthlyReset => SweepKind::MonthlyReset,
            SweepArg::Retention => SweepKind::SpendRetention,
        }
    }
}

/// Execute one parsed command, printing its output to stdout.
pub async fn run(cli: Cli, pool: &PgPool, config: &WorkerConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::RecordSpend {
            brand_name,
            campaign_name,
            amount,
            datetime,
            timeout,
        } => {
            let request =
                resolve_spend(pool, &brand_name, &campaign_name, &amount, datetime.as_deref())
                    .await?;
            let item = WorkItem::RecordSpend(request);
            let row = WorkItemRepo::enqueue(
                pool,
                &NewWorkItem::from_item(&item).with_max_attempts(config.spend_max_attempts),
            )
            .await
            .context("Failed to queue spend")?;
            tracing::debug!(task_id = %row.task_id, "Spend queued");

            let finished = wait_for_task(pool, row.task_id, Duration::from_secs(timeout)).await?;
            println!("{}", render_spend_outcome(&finished)?);
        }
        Commands::Sweep { kind } => {
            let kind = SweepKind::from(kind);
            let row = enqueue_sweep(pool, kind, config.sweep_max_attempts).await?;
            println!("Queued {kind} as task {}", row.task_id);
        }
        Commands::Task { task_id } => {
            let row = WorkItemRepo::find_by_task_id(pool, task_id)
                .await?
                .ok_or_else(|| anyhow!("Task {task_id} not found"))?;
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
    }
    Ok(())
}

/// Turn names and raw arguments into a validated spend request.
async fn resolve_spend(
    pool: &PgPool,
    brand_name: &str,
    campaign_name: &str,
    amount: &str,
    datetime: Option<&str>,
) -> anyhow::Result<SpendRequest> {
    let amount = validate_spend_amount(parse_amount(amount)?)?;
    let spend_datetime = datetime.map(parse_datetime).transpose()?;

    let brand = BrandRepo::find_active_by_name(pool, brand_name)
        .await?
        .ok_or_else(|| anyhow!("Brand {brand_name:?} not found or inactive"))?;
    let campaign = CampaignRepo::find_active_by_name(pool, brand.id, campaign_name)
        .await?
        .ok_or_else(|| {
            anyhow!("Campaign {campaign_name:?} not found or inactive for brand {brand_name:?}")
        })?;

    Ok(SpendRequest {
        brand_id: brand.id,
        campaign_id: campaign.id,
        amount,
        spend_datetime,
    })
}

pub fn parse_datetime(raw: &str) -> anyhow::Result<Timestamp> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid datetime {raw:?}, expected RFC 3339"))
}

/// Poll until the task is COMPLETED or FAILED, or `timeout` elapses.
pub async fn wait_for_task(
    pool: &PgPool,
    task_id: Uuid,
    timeout: Duration,
) -> anyhow::Result<WorkItemRow> {
    tokio::time::timeout(timeout, poll_until_finished(pool, task_id))
        .await
        .map_err(|_| {
            anyhow!(
                "Timed out after {}s waiting for task {task_id}; it may still complete",
                timeout.as_secs()
            )
        })?
}

async fn poll_until_finished(pool: &PgPool, task_id: Uuid) -> anyhow::Result<WorkItemRow> {
    loop {
        let row = WorkItemRepo::find_by_task_id(pool, task_id)
            .await?
            .ok_or_else(|| anyhow!("Task {task_id} disappeared from the queue"))?;
        if matches!(
            row.status(),
            Some(WorkItemStatus::Completed | WorkItemStatus::Failed)
        ) {
            return Ok(row);
        }
        tokio::time::sleep(RESULT_POLL_INTERVAL).await;
    }
}

/// Human-readable summary of a finished spend task, or its error.
pub fn render_spend_outcome(row: &WorkItemRow) -> anyhow::Result<String> {
    let result = row.result.as_ref();
    let error = result
        .and_then(|r| r.get("error"))
        .and_then(|e| e.as_str())
        .or(row.last_error.as_deref());

    let succeeded = result
        .and_then(|r| r.get("success"))
        .and_then(|s| s.as_bool())
        .unwrap_or(false);
    if row.status() != Some(WorkItemStatus::Completed) || !succeeded {
        bail!("Spend recording failed: {}", error.unwrap_or("unknown error"));
    }

    let field = |name: &str| {
        result
            .and_then(|r| r.get(name))
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .unwrap_or_else(|| "-".to_string())
    };

    let lines = [
        format!("Spend recorded (record #{})", field("spend_record_id")),
        format!("  Daily remaining:   {}", field("daily_remaining")),
        format!("  Monthly remaining: {}", field("monthly_remaining")),
        format!("  Campaign paused:   {}", field("campaign_paused")),
    ];
    Ok(lines.join("\n"))
}
