//! Linear trend forecast.
//!
//! An ordinary least-squares line through (day offset, value) points,
//! extended past the last observed day. No seasonality and no confidence
//! interval: it is a trend line.

use ads_ingestor::models::record::PerformanceRecord;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::metrics::{GroupBy, Metric, aggregate};

/// Fewest daily points a line is fitted to.
pub const MIN_HISTORY: usize = 3;

/// Longest horizon the CLI accepts, in days.
pub const MAX_HORIZON_DAYS: u32 = 366;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forecast {
    /// Change per day.
    pub slope: f64,
    /// Fitted value on the first observed day.
    pub intercept: f64,
    pub points: Vec<ForecastPoint>,
}

/// Fits `history` and predicts the `days_ahead` days after its last date.
///
/// `None` with fewer than [`MIN_HISTORY`] points, or when every point
/// falls on the same day.
pub fn forecast_linear(history: &[(NaiveDate, f64)], days_ahead: u32) -> Option<Forecast> {
    if history.len() < MIN_HISTORY {
        return None;
    }
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|(date, _)| *date);

    let first = sorted[0].0;
    let last = sorted[sorted.len() - 1].0;
    let xs: Vec<f64> = sorted
        .iter()
        .map(|(date, _)| (*date - first).num_days() as f64)
        .collect();
    let ys: Vec<f64> = sorted.iter().map(|(_, v)| *v).collect();

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return None;
    }

    let last_x = (last - first).num_days();
    // Stops early at the end of the calendar.
    let points = (1..=i64::from(days_ahead))
        .map_while(|ahead| {
            let date = Duration::try_days(ahead).and_then(|d| last.checked_add_signed(d))?;
            Some(ForecastPoint {
                date,
                value: intercept + slope * (last_x + ahead) as f64,
            })
        })
        .collect();

    Some(Forecast {
        slope,
        intercept,
        points,
    })
}

/// Daily values of `metric` across `records`, in date order.
pub fn daily_series<'a>(
    records: impl IntoIterator<Item = &'a PerformanceRecord>,
    metric: Metric,
) -> Vec<(NaiveDate, f64)> {
    aggregate(records, GroupBy::Date)
        .into_iter()
        .filter_map(|row| row.key.date.map(|d| (d, row.totals.value(metric))))
        .collect()
}

#[cfg(test)]
mod tests {
    use ads_ingestor::models::platform::Platform;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn perfect_line_extends() {
        let history = [(day(1), 10.0), (day(2), 12.0), (day(3), 14.0)];
        let forecast = forecast_linear(&history, 1).unwrap();
        assert_eq!(forecast.slope, 2.0);
        assert_eq!(forecast.points, [ForecastPoint { date: day(4), value: 16.0 }]);
    }

    #[test]
    fn unsorted_history_with_gaps() {
        let history = [(day(5), 20.0), (day(1), 12.0), (day(3), 16.0)];
        let forecast = forecast_linear(&history, 2).unwrap();
        assert_eq!(forecast.points[0].date, day(6));
        assert!((forecast.points[0].value - 22.0).abs() < 1e-9);
        assert!((forecast.points[1].value - 24.0).abs() < 1e-9);
    }

    #[test]
    fn too_short_or_degenerate_history() {
        assert!(forecast_linear(&[(day(1), 1.0), (day(2), 2.0)], 7).is_none());
        assert!(forecast_linear(&[], 7).is_none());
        let same_day = [(day(1), 1.0), (day(1), 2.0), (day(1), 3.0)];
        assert!(forecast_linear(&same_day, 7).is_none());
    }

    #[test]
    fn horizon_stops_at_the_last_representable_date() {
        let end = NaiveDate::MAX;
        let history = [
            (end - Duration::days(4), 1.0),
            (end - Duration::days(3), 2.0),
            (end - Duration::days(2), 3.0),
        ];
        let forecast = forecast_linear(&history, 10).unwrap();
        assert_eq!(forecast.points.len(), 2);
        assert_eq!(forecast.points[1].date, end);
    }

    #[test]
    fn series_sums_per_day() {
        let mut a = PerformanceRecord::new(Platform::GoogleAds, "A", day(2));
        a.spend = 3.0;
        let mut b = PerformanceRecord::new(Platform::MetaAds, "B", day(2));
        b.spend = 4.0;
        let mut c = PerformanceRecord::new(Platform::MetaAds, "B", day(1));
        c.spend = 1.0;
        let series = daily_series(&[a, b, c], Metric::Spend);
        assert_eq!(series, [(day(1), 1.0), (day(2), 7.0)]);
    }
}
