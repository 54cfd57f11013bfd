use serde::Serialize;

/// Rounds to two decimal places, the precision every ratio is reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator`, or 0 when the denominator is zero or either
/// side is not finite.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Ratios derived from summed totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    /// clicks / impressions × 100
    pub ctr: f64,
    /// spend / clicks
    pub cpc: f64,
    /// spend / impressions × 1000
    pub cpm: f64,
    /// spend / conversions
    pub cpa: f64,
    /// revenue / spend
    pub roas: f64,
}

impl DerivedMetrics {
    pub fn compute(spend: f64, impressions: u64, clicks: u64, conversions: u64, revenue: f64) -> Self {
        let impressions = impressions as f64;
        let clicks = clicks as f64;
        Self {
            ctr: round2(ratio(clicks, impressions) * 100.0),
            cpc: round2(ratio(spend, clicks)),
            cpm: round2(ratio(spend, impressions) * 1000.0),
            cpa: round2(ratio(spend, conversions as f64)),
            roas: round2(ratio(revenue, spend)),
        }
    }
}
