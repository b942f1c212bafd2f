//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - The `Deserialize`/insert DTOs the repositories accept

pub mod batch;
pub mod generation;
pub mod status;
pub mod task;
