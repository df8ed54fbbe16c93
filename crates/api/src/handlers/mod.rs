pub mod healthchecks;
