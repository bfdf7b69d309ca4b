//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod brand;
pub mod budget_summary;
pub mod campaign;
pub mod dayparting_schedule;
pub mod spend_record;
pub mod status;
pub mod work_item;
