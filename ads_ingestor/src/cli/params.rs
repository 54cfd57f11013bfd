use std::{error::Error, fs, path::Path};

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::date_range::{DateRange, parse_date};

/// Resolves the fetch window from the optional bounds and a day count.
pub fn parse_range(
    since: Option<&str>,
    until: Option<&str>,
    days: u32,
    today: NaiveDate,
) -> Result<DateRange, Box<dyn Error>> {
    let until = match until {
        Some(u) => parse_date(u)?,
        None => today,
    };
    let range = match since {
        Some(s) => DateRange::new(parse_date(s)?, until)?,
        None => DateRange::last_n_days(until, days)?,
    };
    Ok(range)
}

/// Reads the items of a submission: either a JSON array, a single object,
/// or an object with a `dados` array.
pub fn parse_items_from_json_value(value: Value) -> Result<Vec<Value>, Box<dyn Error>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("dados") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err("`dados` must be an array".into()),
            None => Ok(vec![Value::Object(map)]),
        },
        _ => Err("submission input must be a JSON array or object".into()),
    }
}

pub fn parse_items_from_file(path: &Path) -> Result<Vec<Value>, Box<dyn Error>> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    parse_items_from_json_value(value)
}
