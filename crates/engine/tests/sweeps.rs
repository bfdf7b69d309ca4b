//! Reconciliation sweeps, resets, retention and work-item execution.

mod common;

use adpace_core::campaign_status::CampaignStatus;
use adpace_core::schedule::SweepKind;
use adpace_core::work::{SpendRequest, WorkItem};
use adpace_db::repositories::{BudgetSummaryRepo, CampaignRepo, SpendRecordRepo};
use adpace_engine::execute::execute;
use adpace_engine::ledger::{self, Period};
use adpace_engine::sweeps::{self, SweepOptions};
use adpace_engine::{campaigns, spend};
use chrono::NaiveDate;
use common::*;
use rust_decimal_macros::dec;
use serde_json::json;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Dayparting sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dayparting_sweep_pauses_and_resumes(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let running = campaign_with_status(&pool, b.id, "running", CampaignStatus::Active).await;
    let waiting = campaign_with_status(&pool, b.id, "waiting", CampaignStatus::PausedDaypart).await;
    let idle = campaign(&pool, b.id, "idle").await;
    for c in [&running, &waiting, &idle] {
        window(&pool, c.id, MONDAY, 8, 20).await;
    }
    let cancel = CancellationToken::new();

    // Monday 21:00: outside every window.
    let report = sweeps::dayparting_sweep(&pool, utc(2024, 1, 1, 21, 0), &cancel).await.unwrap();
    assert_eq!(report.examined, 3);
    assert_eq!(report.mutated, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(status_of(&pool, running.id).await, CampaignStatus::PausedDaypart);

    // Next Monday 09:00: both daypart-paused campaigns come back, the
    // inactive one is left alone.
    let report = sweeps::dayparting_sweep(&pool, utc(2024, 1, 8, 9, 0), &cancel).await.unwrap();
    assert_eq!(report.mutated, 2);
    assert_eq!(status_of(&pool, running.id).await, CampaignStatus::Active);
    assert_eq!(status_of(&pool, waiting.id).await, CampaignStatus::Active);
    assert_eq!(status_of(&pool, idle.id).await, CampaignStatus::Inactive);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dayparting_sweep_pauses_campaign_without_schedule(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let c = campaign_with_status(&pool, b.id, "one", CampaignStatus::Active).await;

    let report = sweeps::dayparting_sweep(&pool, utc(2024, 1, 1, 12, 0), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.mutated, 1);
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::PausedDaypart);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dayparting_sweep_keeps_paused_without_budget(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let c = campaign_with_status(&pool, b.id, "one", CampaignStatus::PausedDaypart).await;
    always_open(&pool, c.id).await;
    let now = utc(2024, 1, 1, 12, 0);
    ledger::record_spend(&pool, b.id, c.id, dec!(100), now).await.unwrap();

    let report = sweeps::dayparting_sweep(&pool, now, &CancellationToken::new()).await.unwrap();
    assert_eq!(report.mutated, 0);
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::PausedDaypart);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sweep_skips_manually_disabled(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let c = campaign_with_status(&pool, b.id, "one", CampaignStatus::Active).await;
    CampaignRepo::set_active(&pool, c.id, false).await.unwrap();

    let report = sweeps::dayparting_sweep(&pool, utc(2024, 1, 1, 12, 0), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::Active);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sweep_isolates_entity_failures(pool: PgPool) {
    let broken = brand(&pool, "Broken", dec!(100), dec!(1000), "UTC").await;
    let healthy = brand(&pool, "Healthy", dec!(100), dec!(1000), "UTC").await;
    let bad = campaign_with_status(&pool, broken.id, "bad", CampaignStatus::Active).await;
    let good = campaign_with_status(&pool, healthy.id, "good", CampaignStatus::Active).await;

    sqlx::query("UPDATE brands SET timezone = 'Mars/Olympus_Mons' WHERE id = $1")
        .bind(broken.id)
        .execute(&pool)
        .await
        .unwrap();

    let report = sweeps::dayparting_sweep(&pool, utc(2024, 1, 1, 12, 0), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.mutated, 1);
    assert_eq!(status_of(&pool, bad.id).await, CampaignStatus::Active);
    assert_eq!(status_of(&pool, good.id).await, CampaignStatus::PausedDaypart);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancelled_sweep_stops_before_first_entity(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let c = campaign_with_status(&pool, b.id, "one", CampaignStatus::Active).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = sweeps::dayparting_sweep(&pool, utc(2024, 1, 1, 12, 0), &cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.examined, 0);
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::Active);
}

// ---------------------------------------------------------------------------
// Budget sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_budget_sweep_pauses_overspent(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let c = campaign_with_status(&pool, b.id, "one", CampaignStatus::Active).await;
    let daypart = campaign_with_status(&pool, b.id, "two", CampaignStatus::PausedDaypart).await;
    let now = utc(2024, 1, 1, 12, 0);
    // Written straight to the ledger, so nothing paused the campaign yet.
    ledger::record_spend(&pool, b.id, c.id, dec!(100), now).await.unwrap();

    let report = sweeps::budget_sweep(&pool, now, &CancellationToken::new()).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.mutated, 1);
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::PausedBudget);
    assert_eq!(status_of(&pool, daypart.id).await, CampaignStatus::PausedDaypart);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_budget_sweep_resumes_only_in_window(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let inside = campaign_with_status(&pool, b.id, "inside", CampaignStatus::PausedBudget).await;
    let outside = campaign_with_status(&pool, b.id, "outside", CampaignStatus::PausedBudget).await;
    window(&pool, inside.id, MONDAY, 8, 20).await;
    window(&pool, outside.id, TUESDAY, 8, 20).await;

    let report = sweeps::budget_sweep(&pool, utc(2024, 1, 1, 12, 0), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.mutated, 1);
    assert_eq!(status_of(&pool, inside.id).await, CampaignStatus::Active);
    assert_eq!(status_of(&pool, outside.id).await, CampaignStatus::PausedBudget);
}

// ---------------------------------------------------------------------------
// Resets
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_daily_reset_same_day_reactivates(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let c = campaign_with_status(&pool, b.id, "one", CampaignStatus::Active).await;
    always_open(&pool, c.id).await;
    let now = utc(2024, 1, 1, 10, 0);

    let spent = SpendRequest {
        brand_id: b.id,
        campaign_id: c.id,
        amount: dec!(100),
        spend_datetime: None,
    };
    assert!(spend::record_spend(&pool, &spent, now).await.unwrap().campaign_paused);

    let report = sweeps::budget_reset(&pool, Period::Daily, now, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.sweep, SweepKind::DailyReset);
    assert_eq!(report.examined, 2);
    assert_eq!(report.mutated, 2);
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::Active);

    let summary = BudgetSummaryRepo::find(&pool, b.id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.daily_spend, dec!(0));
    assert_eq!(summary.monthly_spend, dec!(100.00));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_budget_paused_campaign_follows_window_across_midnight(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "Asia/Karachi").await;
    let c = campaign(&pool, b.id, "one").await;
    window(&pool, c.id, MONDAY, 8, 20).await;
    window(&pool, c.id, TUESDAY, 8, 20).await;
    let cancel = CancellationToken::new();

    // Monday 09:00 in Karachi.
    let monday = utc(2024, 1, 1, 4, 0);
    assert_eq!(campaigns::activate(&pool, c.id, monday).await.unwrap().status, CampaignStatus::Active);

    let spent = SpendRequest {
        brand_id: b.id,
        campaign_id: c.id,
        amount: dec!(100),
        spend_datetime: None,
    };
    let recorded = spend::record_spend(&pool, &spent, monday).await.unwrap();
    assert_eq!(recorded.daily_remaining, dec!(0.00));
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::PausedBudget);

    // 00:00 UTC is 05:00 Tuesday in Karachi: budget is back, window is not.
    let report = sweeps::budget_reset(&pool, Period::Daily, utc(2024, 1, 2, 0, 0), &cancel)
        .await
        .unwrap();
    assert_eq!(report.failed, 0);
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::PausedBudget);

    let tuesday = BudgetSummaryRepo::find(&pool, b.id, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tuesday.daily_remaining, dec!(100.00));
    assert_eq!(tuesday.monthly_spend, dec!(100.00));

    // Tuesday 09:00 in Karachi: the budget sweep brings it back.
    let report = sweeps::budget_sweep(&pool, utc(2024, 1, 2, 4, 0), &cancel).await.unwrap();
    assert_eq!(report.mutated, 1);
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::Active);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_monthly_reset_clears_month_counter(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(150), "UTC").await;
    let c = campaign_with_status(&pool, b.id, "one", CampaignStatus::Active).await;
    always_open(&pool, c.id).await;

    ledger::record_spend(&pool, b.id, c.id, dec!(90), utc(2024, 1, 30, 10, 0)).await.unwrap();
    ledger::record_spend(&pool, b.id, c.id, dec!(60), utc(2024, 1, 31, 10, 0)).await.unwrap();
    CampaignRepo::set_status(&pool, c.id, CampaignStatus::PausedBudget).await.unwrap();

    let now = utc(2024, 1, 31, 18, 0);
    let report = sweeps::budget_reset(&pool, Period::Monthly, now, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.sweep, SweepKind::MonthlyReset);

    let summary = BudgetSummaryRepo::find(&pool, b.id, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.monthly_spend, dec!(0));
    assert_eq!(summary.monthly_remaining, dec!(150.00));
    assert_eq!(summary.daily_spend, dec!(60.00));
    assert_eq!(status_of(&pool, c.id).await, CampaignStatus::Active);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reset_skips_inactive_brands(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    sqlx::query("UPDATE brands SET is_active = FALSE WHERE id = $1")
        .bind(b.id)
        .execute(&pool)
        .await
        .unwrap();

    let report = sweeps::budget_reset(&pool, Period::Daily, utc(2024, 1, 1, 0, 0), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.examined, 0);
    assert!(BudgetSummaryRepo::find(&pool, b.id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retention_purges_old_records(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(1000), dec!(10000), "UTC").await;
    let c = campaign(&pool, b.id, "one").await;
    ledger::record_spend(&pool, b.id, c.id, dec!(1), utc(2024, 1, 1, 12, 0)).await.unwrap();
    ledger::record_spend(&pool, b.id, c.id, dec!(1), utc(2024, 3, 30, 12, 0)).await.unwrap();
    ledger::record_spend(&pool, b.id, c.id, dec!(1), utc(2024, 3, 31, 12, 0)).await.unwrap();

    // Cutoff is 2024-03-31 (90 days before 2024-06-29).
    let report = sweeps::purge_spend_records(&pool, utc(2024, 6, 29, 3, 0), 90).await.unwrap();
    assert_eq!(report.sweep, SweepKind::SpendRetention);
    assert_eq!(report.mutated, 2);
    assert_eq!(SpendRecordRepo::count_for_brand(&pool, b.id).await.unwrap(), 1);
    assert!(BudgetSummaryRepo::find(&pool, b.id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap()
        .is_some());
}

// ---------------------------------------------------------------------------
// Work-item execution
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_execute_spend_success_payload(pool: PgPool) {
    let b = brand(&pool, "Acme", dec!(100), dec!(1000), "UTC").await;
    let c = campaign_with_status(&pool, b.id, "one", CampaignStatus::Active).await;
    let item = WorkItem::RecordSpend(SpendRequest {
        brand_id: b.id,
        campaign_id: c.id,
        amount: dec!(12.5),
        spend_datetime: None,
    });

    let result = execute(
        &pool,
        &item,
        utc(2024, 1, 1, 12, 0),
        SweepOptions::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(result["success"], json!(true));
    assert_eq!(result["daily_remaining"], json!("87.50"));
    assert_eq!(result["monthly_remaining"], json!("987.50"));
    assert_eq!(result["campaign_paused"], json!(false));
    assert!(result["spend_record_id"].is_i64());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_execute_reports_caller_errors_as_results(pool: PgPool) {
    let item = WorkItem::RecordSpend(SpendRequest {
        brand_id: 404,
        campaign_id: 1,
        amount: dec!(1),
        spend_datetime: None,
    });

    let result = execute(
        &pool,
        &item,
        utc(2024, 1, 1, 12, 0),
        SweepOptions::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        result,
        json!({ "success": false, "error": "Entity not found: Brand with id 404" })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_execute_sweep_returns_report(pool: PgPool) {
    let result = execute(
        &pool,
        &WorkItem::Sweep(SweepKind::Budget),
        utc(2024, 1, 1, 12, 5),
        SweepOptions::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(result["success"], json!(true));
    assert_eq!(result["sweep"], json!("budget_sweep"));
    assert_eq!(result["examined"], json!(0));
    assert_eq!(result["cancelled"], json!(false));
}
