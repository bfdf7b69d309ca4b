//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Methods
//! that may run inside a caller's transaction accept any `PgExecutor`
//! (`&PgPool` or `&mut *tx`); methods that issue several statements which
//! must share a transaction take `&mut PgConnection`.

pub mod brand_repo;
pub mod budget_summary_repo;
pub mod campaign_repo;
pub mod dayparting_schedule_repo;
pub mod spend_record_repo;
pub mod work_item_repo;

pub use brand_repo::BrandRepo;
pub use budget_summary_repo::BudgetSummaryRepo;
pub use campaign_repo::CampaignRepo;
pub use dayparting_schedule_repo::DaypartingScheduleRepo;
pub use spend_record_repo::SpendRecordRepo;
pub use work_item_repo::WorkItemRepo;
