//! Traffic-light status for dashboard metrics.
//!
//! With a previous period, a metric is judged by its delta; without one, by
//! fixed [`Benchmarks`]. Spend has one override: when spend fell while
//! conversions rose, spend is `Good` before any other rule is consulted.

use serde::{Deserialize, Serialize};

use crate::metrics::Metric;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Warning,
    Bad,
    /// No rule applies to this metric.
    Neutral,
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Good => "●",
            Status::Warning => "▲",
            Status::Bad => "▼",
            Status::Neutral => "·",
        }
    }
}

/// Drop below which a "higher is better" metric turns from warning to bad.
pub const WARNING_DROP_PCT: f64 = -10.0;

/// Band for a metric where lower is better: `<= good` is good,
/// `<= warning` is a warning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CeilingBand {
    pub good: f64,
    pub warning: f64,
}

/// Band for a metric where higher is better: `>= good` is good,
/// `>= warning` is a warning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloorBand {
    pub good: f64,
    pub warning: f64,
}

/// Ideal interval; above it is a warning, below it is bad.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdealRange {
    pub min: f64,
    pub max: f64,
}

/// Absolute thresholds used when there is no previous period.
///
/// CTR is in percent, like [`DerivedMetrics::ctr`](crate::metrics::DerivedMetrics).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Benchmarks {
    pub cpa: CeilingBand,
    pub ctr: FloorBand,
    pub roas: FloorBand,
    pub frequency: IdealRange,
}

impl Default for Benchmarks {
    fn default() -> Self {
        Self {
            cpa: CeilingBand {
                good: 10.0,
                warning: 20.0,
            },
            ctr: FloorBand {
                good: 1.5,
                warning: 0.8,
            },
            roas: FloorBand {
                good: 3.0,
                warning: 2.0,
            },
            frequency: IdealRange { min: 1.5, max: 3.0 },
        }
    }
}

pub fn classify_delta(metric: Metric, delta: f64) -> Status {
    if metric.lower_is_better() {
        if delta < 0.0 { Status::Good } else { Status::Bad }
    } else if metric == Metric::Frequency {
        if delta < 0.0 {
            Status::Good
        } else {
            Status::Warning
        }
    } else if delta > 0.0 {
        Status::Good
    } else if delta >= WARNING_DROP_PCT {
        Status::Warning
    } else {
        Status::Bad
    }
}

pub fn classify_absolute(metric: Metric, value: f64, benchmarks: &Benchmarks) -> Status {
    let floor = |band: &FloorBand| {
        if value >= band.good {
            Status::Good
        } else if value >= band.warning {
            Status::Warning
        } else {
            Status::Bad
        }
    };

    match metric {
        Metric::Cpa => {
            if value <= benchmarks.cpa.good {
                Status::Good
            } else if value <= benchmarks.cpa.warning {
                Status::Warning
            } else {
                Status::Bad
            }
        }
        Metric::Ctr => floor(&benchmarks.ctr),
        Metric::Roas => floor(&benchmarks.roas),
        Metric::Frequency => {
            let range = &benchmarks.frequency;
            if (range.min..=range.max).contains(&value) {
                Status::Good
            } else if value > range.max {
                Status::Warning
            } else {
                Status::Bad
            }
        }
        _ => Status::Neutral,
    }
}

/// Spend and conversion deltas of the same comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpendContext {
    pub spend_delta: Option<f64>,
    pub conversions_delta: Option<f64>,
}

impl SpendContext {
    /// Spend went down while conversions went up.
    pub fn efficiency_improved(&self) -> bool {
        matches!(
            (self.spend_delta, self.conversions_delta),
            (Some(s), Some(c)) if s < 0.0 && c > 0.0
        )
    }
}

/// Status of `metric` given its value and, when a previous period exists,
/// its delta.
pub fn classify(
    metric: Metric,
    value: f64,
    delta: Option<f64>,
    context: &SpendContext,
    benchmarks: &Benchmarks,
) -> Status {
    if metric == Metric::Spend && context.efficiency_improved() {
        return Status::Good;
    }
    match delta {
        Some(delta) => classify_delta(metric, delta),
        None => classify_absolute(metric, value, benchmarks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_cpa_bands() {
        let b = Benchmarks::default();
        assert_eq!(classify_absolute(Metric::Cpa, 8.0, &b), Status::Good);
        assert_eq!(classify_absolute(Metric::Cpa, 15.0, &b), Status::Warning);
        assert_eq!(classify_absolute(Metric::Cpa, 25.0, &b), Status::Bad);
    }

    #[test]
    fn absolute_floor_and_range_bands() {
        let b = Benchmarks::default();
        assert_eq!(classify_absolute(Metric::Roas, 3.0, &b), Status::Good);
        assert_eq!(classify_absolute(Metric::Roas, 2.5, &b), Status::Warning);
        assert_eq!(classify_absolute(Metric::Ctr, 0.5, &b), Status::Bad);
        assert_eq!(classify_absolute(Metric::Frequency, 2.0, &b), Status::Good);
        assert_eq!(classify_absolute(Metric::Frequency, 3.5, &b), Status::Warning);
        assert_eq!(classify_absolute(Metric::Frequency, 1.0, &b), Status::Bad);
        assert_eq!(classify_absolute(Metric::Clicks, 1.0, &b), Status::Neutral);
    }

    #[test]
    fn delta_rules() {
        assert_eq!(classify_delta(Metric::Cpc, -1.0), Status::Good);
        assert_eq!(classify_delta(Metric::Cpm, 0.0), Status::Bad);
        assert_eq!(classify_delta(Metric::Frequency, 5.0), Status::Warning);
        assert_eq!(classify_delta(Metric::Frequency, -5.0), Status::Good);
        assert_eq!(classify_delta(Metric::Clicks, 0.1), Status::Good);
        assert_eq!(classify_delta(Metric::Clicks, 0.0), Status::Warning);
        assert_eq!(classify_delta(Metric::Clicks, -10.0), Status::Warning);
        assert_eq!(classify_delta(Metric::Clicks, -10.01), Status::Bad);
    }

    #[test]
    fn spend_override_fires_before_generic_rules() {
        let b = Benchmarks::default();
        let context = SpendContext {
            spend_delta: Some(-15.0),
            conversions_delta: Some(10.0),
        };
        assert_eq!(
            classify(Metric::Spend, 850.0, Some(-15.0), &context, &b),
            Status::Good
        );
        // The generic rule alone would call a 15% drop bad.
        assert_eq!(classify_delta(Metric::Spend, -15.0), Status::Bad);
        // The override is for spend only.
        assert_eq!(
            classify(Metric::Clicks, 1.0, Some(-15.0), &context, &b),
            Status::Bad
        );
    }

    #[test]
    fn no_delta_falls_back_to_benchmarks() {
        let b = Benchmarks::default();
        let none = SpendContext::default();
        assert_eq!(classify(Metric::Cpa, 8.0, None, &none, &b), Status::Good);
        assert_eq!(classify(Metric::Spend, 8.0, None, &none, &b), Status::Neutral);
    }

    #[test]
    fn status_wire_names() {
        insta::assert_json_snapshot!(
            [Status::Good, Status::Warning, Status::Bad, Status::Neutral],
            @r#"
        [
          "good",
          "warning",
          "bad",
          "neutral"
        ]
        "#
        );
    }

    #[test]
    fn benchmarks_read_from_partial_toml() {
        let b: Benchmarks = toml::from_str("[cpa]\ngood = 30.0\nwarning = 50.0\n").unwrap();
        assert_eq!(b.cpa.good, 30.0);
        assert_eq!(b.roas, Benchmarks::default().roas);
    }
}
