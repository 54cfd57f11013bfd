//! Lenient numeric coercion for vendor JSON.
//!
//! Reporting APIs are inconsistent about types: the Graph API sends every
//! metric as a string, connectors mix numbers, strings and `null`. Values
//! that cannot be read as a finite number are treated as missing, and the
//! callers sum missing values as zero.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads a JSON number or numeric string as `f64`.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;
    n.is_finite().then_some(n)
}

/// Reads a JSON count. Fractional counts are rounded; negatives clamp to zero.
pub fn value_as_u64(value: &Value) -> Option<u64> {
    if let Value::Number(n) = value {
        if let Some(u) = n.as_u64() {
            return Some(u);
        }
    }
    value_as_f64(value).map(|f| f.max(0.0).round() as u64)
}

pub fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_as_f64).unwrap_or(0.0))
}

pub fn de_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_as_u64).unwrap_or(0))
}

pub fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_as_f64))
}

pub fn de_opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_as_u64))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_and_numeric_strings() {
        assert_eq!(value_as_f64(&json!(12.5)), Some(12.5));
        assert_eq!(value_as_f64(&json!(" 7.25 ")), Some(7.25));
        assert_eq!(value_as_f64(&json!("n/a")), None);
        assert_eq!(value_as_f64(&json!(null)), None);
        assert_eq!(value_as_f64(&json!("NaN")), None);
    }

    #[test]
    fn counts_round_and_clamp() {
        assert_eq!(value_as_u64(&json!(42)), Some(42));
        assert_eq!(value_as_u64(&json!("3.0")), Some(3));
        assert_eq!(value_as_u64(&json!(2.6)), Some(3));
        assert_eq!(value_as_u64(&json!(-4)), Some(0));
        assert_eq!(value_as_u64(&json!([])), None);
    }
}
