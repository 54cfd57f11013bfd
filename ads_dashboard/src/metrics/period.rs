use indexmap::IndexMap;
use serde::Serialize;

use crate::metrics::{Metric, aggregate::Totals, derived::round2};

/// Percentage change from `previous` to `current`, rounded to two decimals.
///
/// Zero whenever `previous` is zero, whatever `current` is.
pub fn delta_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return 0.0;
    }
    round2((current - previous) / previous * 100.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MetricDelta {
    pub current: f64,
    pub previous: f64,
    pub delta_pct: f64,
}

/// Current against previous totals, for every [`Metric`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub current: Totals,
    pub previous: Totals,
    pub deltas: IndexMap<Metric, MetricDelta>,
}

impl PeriodComparison {
    pub fn compute(current: &Totals, previous: &Totals) -> Self {
        let deltas = Metric::ALL
            .into_iter()
            .map(|metric| {
                let (c, p) = (current.value(metric), previous.value(metric));
                (
                    metric,
                    MetricDelta {
                        current: c,
                        previous: p,
                        delta_pct: delta_pct(c, p),
                    },
                )
            })
            .collect();

        Self {
            current: current.clone(),
            previous: previous.clone(),
            deltas,
        }
    }

    pub fn delta(&self, metric: Metric) -> f64 {
        self.deltas.get(&metric).map_or(0.0, |d| d.delta_pct)
    }

    /// Whether there is a previous period to compare against at all.
    pub fn has_previous(&self) -> bool {
        !self.previous.is_empty()
    }
}
