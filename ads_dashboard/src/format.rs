//! Brazilian-locale display strings: `.` groups thousands, `,` marks
//! decimals. Display only; nothing formatted here is parsed back.

use crate::metrics::Metric;

/// Shown for values that cannot be displayed (NaN, infinities).
pub const NOT_AVAILABLE: &str = "N/A";

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `value` with `places` decimals, e.g. `1234.5, 2` → `"1.234,50"`.
pub fn format_decimal(value: f64, places: usize) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let fixed = format!("{:.*}", places, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    // "-0,00" reads oddly; a value that rounds to zero drops its sign.
    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// `"R$ 1.234,56"`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("R$ {}", format_decimal(value, 2))
}

/// Whole number with thousands grouping; fractions are truncated.
pub fn format_count(value: f64) -> String {
    format_decimal(value.trunc(), 0)
}

/// `"1,23%"`.
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{}%", format_decimal(value, 2))
}

/// Arrow and one-decimal magnitude, e.g. `"↓ 15,0%"`.
pub fn format_delta(delta: f64) -> String {
    if !delta.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let arrow = if delta >= 0.0 { "↑" } else { "↓" };
    format!("{arrow} {}%", format_decimal(delta.abs(), 1))
}

/// Formats `value` the way the dashboard shows `metric`.
pub fn format_metric(metric: Metric, value: f64) -> String {
    if metric.is_count() {
        format_count(value)
    } else if metric.is_currency() {
        format_currency(value)
    } else if metric == Metric::Ctr {
        format_percent(value)
    } else {
        format_decimal(value, 2)
    }
}
