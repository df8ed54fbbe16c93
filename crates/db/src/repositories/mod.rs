//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod engine_config_repo;
pub mod operation_repo;
pub mod report_repo;

pub use engine_config_repo::EngineConfigRepo;
pub use operation_repo::OperationRepo;
pub use report_repo::ReportRepo;
