//! Clients for the external metric sources consumed by the health-check
//! engine: the monitored MySQL target and the operational metrics backend.
//!
//! Each source sits behind a capability trait so the engine and its tests
//! can substitute implementations freely.

pub mod error;
pub mod mysql;
pub mod prometheus;
pub mod source;

pub use error::SourceError;
pub use mysql::MySqlTarget;
pub use prometheus::PrometheusClient;
pub use source::{MetricsBackend, SlowQuerySource, SlowQueryStats, VariableSource};
