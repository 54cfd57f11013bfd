use serde::{Deserialize, Serialize};

use crate::{models::date_range::DateRange, providers::meta_graph::InsightsParams};

/// Vendor-agnostic parameters for a performance report request.
///
/// This is the standard input for every
/// [`ReportSource`](crate::providers::ReportSource) implementation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Inclusive window of days to report on.
    pub range: DateRange,

    /// Optional, source-specific parameters.
    #[serde(default)]
    pub provider_specific: ProviderParams,
}

impl ReportRequest {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            provider_specific: ProviderParams::None,
        }
    }
}

/// Source-specific request options that do not belong in [`ReportRequest`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ProviderParams {
    #[default]
    None,
    MetaGraph(InsightsParams),
}
