//! Reporting-connector source: a JSON export endpoint that proxies the
//! Google Ads and Meta Ads reporting APIs behind one query format.

pub mod params;
pub mod provider;
pub mod response;

pub use params::ConnectorParams;
pub use provider::ConnectorSource;
