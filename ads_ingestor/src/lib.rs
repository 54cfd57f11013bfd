//! Data access for the ads dashboards: report sources for Google Ads and
//! Meta Ads, the Graph API client, CSV export and the creation webhook.

#[cfg(feature = "cli")]
pub mod cli;
pub mod errors;
pub mod io;
pub mod models;
pub mod providers;
pub mod webhook;

pub use errors::Error;
