//! Pure domain logic for the steward control plane.
//!
//! No I/O and no database access live here — only the error taxonomy,
//! shared type aliases, category definitions, and the scoring policy.

pub mod categories;
pub mod error;
pub mod scoring;
pub mod types;
