use thiserror::Error;

use crate::{
    io::sink::SinkError, models::date_range::DateRangeError, providers::ProviderError,
    providers::meta_graph::MetaApiError, webhook::WebhookError,
};

/// The unified error type for the `ads_ingestor` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A report source failed (HTTP, decoding, validation).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A Graph API call failed after the retry policy ran.
    #[error("Meta API error: {0}")]
    MetaApi(#[from] MetaApiError),

    /// Writing an export failed.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Invalid date range: {0}")]
    DateRange(#[from] DateRangeError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// An error from the Polars library.
    #[error("Polars operation failed")]
    Polars(#[from] polars::prelude::PolarsError),
}
