//! Report sources for ad performance data.
//!
//! This module defines the [`ReportSource`] trait, the unified interface for
//! fetching [`PerformanceRecord`]s from any reporting backend: the reporting
//! connector that proxies Google Ads and Meta Ads exports
//! ([`connector::ConnectorSource`]), or the Meta Graph API itself
//! ([`meta_graph::MetaGraphSource`]).
//!
//! Sources are single-shot: one request per call, no retries, except the
//! Graph API client which retries rate-limited and failed requests per
//! [`retry::RetryPolicy`]. Every failure comes back as a [`ProviderError`]
//! value so callers can carry on with partial data.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use ads_ingestor::models::{
//!     platform::Platform,
//!     record::PerformanceRecord,
//!     request_params::ReportRequest,
//! };
//! use ads_ingestor::providers::{ProviderError, ReportSource};
//!
//! struct Fixture;
//!
//! #[async_trait]
//! impl ReportSource for Fixture {
//!     fn name(&self) -> &str {
//!         "fixture"
//!     }
//!
//!     async fn fetch_records(
//!         &self,
//!         _request: &ReportRequest,
//!     ) -> Result<Vec<PerformanceRecord>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod coerce;
pub mod connector;
pub mod loader;
pub mod meta_graph;
pub mod retry;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, IntoError, Snafu};

use crate::models::{record::PerformanceRecord, request_params::ReportRequest};

/// Trait for fetching performance rows from a reporting backend.
///
/// Implement this trait for each backend. It is object safe, so a dashboard
/// can hold a `Vec<Box<dyn ReportSource>>` chosen from configuration.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Short label used in logs and error messages (e.g. "Google Ads").
    fn name(&self) -> &str;

    /// Fetches all rows for the request's date range.
    ///
    /// An empty `Vec` is a valid answer ("no data"), not an error.
    async fn fetch_records(
        &self,
        request: &ReportRequest,
    ) -> Result<Vec<PerformanceRecord>, ProviderError>;
}

/// Errors that can occur during the creation of a source instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The base URL in the configuration cannot be parsed.
    #[snafu(display("Invalid base URL '{url}'"))]
    InvalidUrl { url: String, backtrace: Backtrace },
}

impl From<MissingEnvVarError> for ProviderInitError {
    fn from(source: MissingEnvVarError) -> Self {
        MissingEnvVarSnafu.into_error(source)
    }
}

impl From<reqwest::Error> for ProviderInitError {
    fn from(source: reqwest::Error) -> Self {
        ClientBuildSnafu.into_error(source)
    }
}

/// Errors that can occur within a `ReportSource` implementation.
///
/// The display strings are meant to be shown to the person looking at the
/// dashboard, so they name the URL or status involved.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// The request did not complete within the source's timeout.
    #[snafu(display("Timed out connecting to {url}"))]
    Timeout { url: String, backtrace: Backtrace },

    /// The server could not be reached at all.
    #[snafu(display("Connection error reaching {url}"))]
    Connection { url: String, backtrace: Backtrace },

    /// Any other transport-level failure.
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The API answered with a non-success status.
    #[snafu(display("HTTP error {status} from {url}: {body}"))]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// The body was not JSON, or not the shape the source expects.
    #[snafu(display("Invalid JSON from {url}: {message}"))]
    Decode {
        url: String,
        message: String,
        backtrace: Backtrace,
    },

    /// The source-level API reported an error (e.g. Graph API retries exhausted).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific source.
    #[snafu(display("Invalid parameters for source: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during source configuration or initialization.
    #[snafu(display("Source initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

/// `url` without its query string, fragment or credentials.
///
/// Request URLs carry API keys and access tokens as query parameters, so
/// only this form may reach logs and error messages.
pub fn redact_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            let _ = parsed.set_password(None);
            let _ = parsed.set_username("");
            parsed.to_string()
        }
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

impl ProviderError {
    /// Maps a transport error onto the timeout / connection / generic variants.
    ///
    /// The request URL is stripped from `err` and `url` is redacted, so the
    /// resulting message never carries query-string credentials.
    pub fn from_transport(url: &str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        let url = redact_url(url);
        let url = url.as_str();
        if err.is_timeout() {
            TimeoutSnafu { url }.build()
        } else if err.is_connect() {
            ConnectionSnafu { url }.build()
        } else if err.is_decode() {
            DecodeSnafu {
                url,
                message: err.to_string(),
            }
            .build()
        } else {
            ReqwestSnafu.into_error(err)
        }
    }
}

impl From<ProviderInitError> for ProviderError {
    fn from(source: ProviderInitError) -> Self {
        InitSnafu.into_error(source)
    }
}
