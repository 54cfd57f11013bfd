//! Advertising platforms and their platform-specific outcome fields.
//!
//! Google Ads reports conversions in `conversions` / `conversion_value`, while
//! Meta Ads reports them as purchase actions / purchase value and adds reach
//! and frequency. [`PlatformMetrics`] is chosen once, when a row is ingested,
//! so aggregation code asks the variant for "conversions" or "revenue" instead
//! of comparing platform names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The advertising platform a record was reported by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "Google Ads")]
    GoogleAds,
    #[serde(rename = "Meta Ads")]
    MetaAds,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::GoogleAds, Platform::MetaAds];

    /// Human-readable name, as shown in tables and exports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::GoogleAds => "Google Ads",
            Platform::MetaAds => "Meta Ads",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match norm.as_str() {
            "google" | "googleads" | "adwords" => Ok(Platform::GoogleAds),
            "meta" | "metaads" | "facebook" | "facebookads" => Ok(Platform::MetaAds),
            _ => Err(format!("unknown platform: {s}")),
        }
    }
}

/// Platform-specific outcome fields of a single performance row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform")]
pub enum PlatformMetrics {
    #[serde(rename = "Google Ads")]
    GoogleAds {
        conversions: u64,
        conversion_value: f64,
    },
    #[serde(rename = "Meta Ads")]
    MetaAds {
        purchase_actions: u64,
        purchase_value: f64,
        /// Unique accounts reached. Not every Meta export carries it.
        reach: Option<u64>,
        /// Average exposures per reached account.
        frequency: Option<f64>,
    },
}

impl PlatformMetrics {
    /// An empty outcome for `platform`.
    pub fn empty(platform: Platform) -> Self {
        match platform {
            Platform::GoogleAds => PlatformMetrics::GoogleAds {
                conversions: 0,
                conversion_value: 0.0,
            },
            Platform::MetaAds => PlatformMetrics::MetaAds {
                purchase_actions: 0,
                purchase_value: 0.0,
                reach: None,
                frequency: None,
            },
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            PlatformMetrics::GoogleAds { .. } => Platform::GoogleAds,
            PlatformMetrics::MetaAds { .. } => Platform::MetaAds,
        }
    }

    /// Conversion count from the platform's native field.
    pub fn conversions(&self) -> u64 {
        match self {
            PlatformMetrics::GoogleAds { conversions, .. } => *conversions,
            PlatformMetrics::MetaAds {
                purchase_actions, ..
            } => *purchase_actions,
        }
    }

    /// Conversion value (revenue) from the platform's native field.
    pub fn revenue(&self) -> f64 {
        match self {
            PlatformMetrics::GoogleAds {
                conversion_value, ..
            } => *conversion_value,
            PlatformMetrics::MetaAds { purchase_value, .. } => *purchase_value,
        }
    }

    pub fn reach(&self) -> Option<u64> {
        match self {
            PlatformMetrics::GoogleAds { .. } => None,
            PlatformMetrics::MetaAds { reach, .. } => *reach,
        }
    }

    pub fn frequency(&self) -> Option<f64> {
        match self {
            PlatformMetrics::GoogleAds { .. } => None,
            PlatformMetrics::MetaAds { frequency, .. } => *frequency,
        }
    }
}
