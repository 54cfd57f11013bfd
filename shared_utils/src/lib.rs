//! Small helpers shared by the ingestor and the dashboard.

pub mod env;
