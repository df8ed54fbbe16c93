//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts where the API accepts one

pub mod engine_config;
pub mod operation;
pub mod report;
pub mod status;
