//! The health-check subsystem: operation lifecycle management and the
//! scoring engine.
//!
//! A check is an asynchronous, long-running diagnostic job against a
//! monitored MySQL server: the service records an operation, spawns the
//! engine on its own task, and callers poll the operation / fetch the
//! persisted report later.

pub mod engine;
pub mod janitor;
pub mod service;
pub mod sources;

pub use engine::{DefaultEngine, Engine};
pub use service::HealthCheckService;
pub use sources::MetricSources;
