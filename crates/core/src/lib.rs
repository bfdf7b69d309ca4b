//! Domain rules for brand budgets, dayparting and campaign status.
//!
//! No I/O lives here. The `db`, `engine`, `api` and `worker` crates all
//! depend on this one for shared types and decisions.

pub mod budget;
pub mod campaign_status;
pub mod dayparting;
pub mod error;
pub mod money;
pub mod retry;
pub mod schedule;
pub mod types;
pub mod work;
