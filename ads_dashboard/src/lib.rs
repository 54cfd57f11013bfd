//! Marketing dashboard over Google Ads and Meta Ads performance data.
//!
//! Records come from `ads_ingestor` sources; this crate aggregates them,
//! compares periods, classifies KPI health, forecasts trends, and keeps the
//! refreshable application state.

pub mod accounts;
pub mod config;
pub mod export;
pub mod forecast;
pub mod format;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod state;
pub mod status;
